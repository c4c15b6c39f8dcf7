mod test_ice_candidates_keep_order;
mod test_offer_answer_relay;
