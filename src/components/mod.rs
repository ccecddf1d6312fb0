pub mod buy_form;
pub mod market;
pub mod wallet;
