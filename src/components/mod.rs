pub mod app;
pub mod layer_menu;
pub mod loading_screen;
pub mod map_view;
pub mod nav_bar;
pub mod search_bar;
pub mod sidebar;
