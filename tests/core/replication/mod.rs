pub mod test_merge;
pub mod test_recovery;
pub mod test_switch;
