use std::path::Path;

use tileson::{LayerKind, ParseStatus, Tileson};

fn main() {
    // Tileson::parse never fails, problems are reported through the status of the map.
    // Files referenced by the map (external tilesets, templates) are read relative to it.
    let path = std::env::args().nth(1).unwrap_or_else(|| "test-maps/ultimate_test.json".into());
    let map = Tileson::new().parse(Path::new(&path));
    if map.status() != ParseStatus::Ok {
        eprintln!("Could not parse '{}': {}", path, map.status_message());
        std::process::exit(1);
    }

    // Keep track how much we need to indent for some nice pretty printing
    let mut indent = 0;

    for (layer, groups_left) in map.iter_layers() {
        // Reduce indentation by the amount of groups left
        indent -= groups_left;

        // print indentation to highlight hierarchy
        print!("{}", "  ".repeat(indent));

        match &layer.kind {
            LayerKind::Tile(tiles) => {
                println!(
                    "Layer '{}' with {}x{} tiles, {} of them set",
                    layer.name, layer.size.x, layer.size.y, tiles.tile_objects().len()
                );
            }
            LayerKind::Group(group) => {
                println!("Group layer '{}' with {} sub-layers", layer.name, group.layers.len());

                // increase indentation for all layers part of this group
                indent += 1;
            }
            LayerKind::Object(objects) => {
                println!("Layer '{}' containing {} objects", layer.name, objects.objects.len());
            }
            LayerKind::Image(image) => {
                println!("Image layer '{}' showing {}", layer.name, image.image.display());
            }
            _ => {
                println!("Unknown layer");
            }
        }
    }
}
