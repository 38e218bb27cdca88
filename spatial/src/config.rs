#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// A leaf splits once it holds this many entries.
    pub node_capacity: usize,
    /// Quadtree cells are doubled from this size until they cover the world.
    pub smallest_cell: f32,
    /// Cell size of the uniform grid backend.
    pub grid_cell_size: f32,
    /// Per-tick travel above which a projectile is ray-tested against ship
    /// parts instead of point-tested.
    pub fast_mover_distance: f32,
    /// Ray width used when resolving which ship part a beam struck.
    pub beam_hit_width: f32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            node_capacity: 4,
            smallest_cell: 1024.0,
            grid_cell_size: 20_000.0,
            fast_mover_distance: 15.0,
            beam_hit_width: 8.0,
        }
    }
}
