pub mod eq_bars;
pub mod scope_panel;
pub mod station_panel;
pub mod status_bar;
