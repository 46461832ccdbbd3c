pub mod force_graph;
pub mod friend_panel;
