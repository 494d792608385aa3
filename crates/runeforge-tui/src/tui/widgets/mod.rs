// TUI widget modules for each dashboard panel.

pub mod build;
pub mod help_bar;
pub mod status_bar;
pub mod tier_list;
