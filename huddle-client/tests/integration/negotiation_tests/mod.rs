mod test_newcomer_offers_to_existing_peers;
