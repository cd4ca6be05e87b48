pub mod action_bar;
pub mod modal;
