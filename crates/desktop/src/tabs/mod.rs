pub mod about_tab;
pub mod scenes_tab;
pub mod settings_tab;
