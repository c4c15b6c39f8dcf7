mod test_negotiation_timeout;
mod test_unexpected_signals_ignored;
