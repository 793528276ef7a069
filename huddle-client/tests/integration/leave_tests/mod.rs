mod test_aborted_coordinator_removes_presence;
mod test_leave_releases_everything;
mod test_leave_with_failing_store_completes;
