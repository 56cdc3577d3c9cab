pub mod greedy_allocation;
pub mod grid_projection;
