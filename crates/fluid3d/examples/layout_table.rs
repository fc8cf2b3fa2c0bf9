//! Print the tiled layout chosen for a domain across texture sizes
//!
//! Usage: cargo run --example layout_table -- [Lx Ly Lz]

use fluid3d::*;

fn main() {
    env_logger::init();

    let args: Vec<f32> = std::env::args()
        .skip(1)
        .filter_map(|s| s.parse().ok())
        .collect();
    let domain = match args.as_slice() {
        [x, y, z] => Vec3::new(*x, *y, *z),
        _ => Vec3::splat(20.0),
    };

    println!("Domain {domain}");
    println!(
        "{:>10} | {:>12} | {:>10} | {:>8} | {:>6} | {:>5}",
        "max", "texture", "tile", "slices", "iters", "exact"
    );

    for side in [32u32, 64, 128, 256, 512, 1024, 2048, 4096] {
        let max = UVec2::splat(side);
        match TiledLayout::compute(max, domain) {
            Ok(layout) => {
                let max = layout.max_texture();
                let texture = layout.texture_resolution();
                let tile = layout.tile_resolution();
                let search = layout.search();
                println!(
                    "{:>10} | {:>12} | {:>10} | {:>8} | {:>6} | {:>5}",
                    format!("{}x{}", max.x, max.y),
                    format!("{}x{}", texture.x, texture.y),
                    format!("{}x{}", tile.x, tile.y),
                    layout.tile_count().z,
                    format!("{}/{}", search.iterations, search.max_iterations),
                    search.exact
                );
            }
            Err(err) => println!("{:>10} | {err}", format!("{side}x{side}")),
        }
    }
}
