mod test_send;
mod test_verify;
