mod test_duplicate_candidate_is_not_fatal;
mod test_early_candidates;
mod test_yielded_session_replays_candidates_once;
