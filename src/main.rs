mod components;
mod config;
mod error;
mod model;
mod state;
mod util;
mod web;

fn main() {
    util::init_logging();
    log::info!("Humble Nomad starting");
    yew::Renderer::<components::app::App>::new().render();
}
