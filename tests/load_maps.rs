use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tileson::*;
use tileson::math::{fvec2, ivec2, Rect};

fn load_ultimate_map() -> Map {
    let map = Tileson::new().parse(Path::new("test-maps/ultimate_test.json"));
    assert_eq!(map.status(), ParseStatus::Ok, "{}", map.status_message());
    map
}

#[test]
fn load_ultimate_map_header() -> Result<()> {
    let map = load_ultimate_map();

    assert_eq!(map.size, ivec2::new(3, 2));
    assert_eq!(map.tile_size, ivec2::new(16, 16));
    assert_eq!(map.orientation, Orientation::Orthogonal);
    assert_eq!(map.renderorder, Renderorder::RightDown);
    assert_eq!(map.tiled_version, "1.10.2");
    assert_eq!(map.type_, "map");
    assert_eq!(map.next_layer_id, 6);
    assert_eq!(map.next_object_id, 4);
    assert!(!map.infinite);
    assert_eq!(map.background_color, Some("#ff336699".parse()?));

    let props = &map.properties;
    assert_eq!(props.len(), 7);
    assert_eq!(props.get_value::<String>("author"), "tileson");
    assert_eq!(props.get_value::<i32>("difficulty"), 3);
    assert!((props.get_value::<f32>("gravity") - 9.81).abs() < 1e-5);
    assert!(!props.get_value::<bool>("hard"));
    assert_eq!(props.get_value::<Color>("tint"), Color::from_argb(255, 0, 255, 0));
    assert_eq!(props.get_value::<PathBuf>("music"), PathBuf::from("music/theme.ogg"));
    assert_eq!(props.get_value::<ObjectReference>("spawn"), ObjectReference(3));
    Ok(())
}

#[test]
fn load_ultimate_map_tilesets() {
    let map = load_ultimate_map();
    assert_eq!(map.tilesets.len(), 2);

    let terrain = map.get_tileset("terrain").expect("terrain tileset");
    assert_eq!(terrain.tileset_type, TilesetType::Image);
    assert_eq!(terrain.image_path, Path::new("test-maps").join("terrain.png"));
    assert_eq!(terrain.last_gid(), 8);
    // one tile is listed in the file, the others are generated
    assert_eq!(terrain.tiles.len(), 8);

    let grass = terrain.get_tile(1).expect("first tile");
    assert_eq!(grass.type_, "grass");
    assert!(grass.properties.get_value::<bool>("solid"));
    assert_eq!(grass.animation.frames(), &[Frame::new(100, 1), Frame::new(100, 2)]);

    let generated = terrain.get_tile(8).expect("generated tile");
    assert_eq!(generated.gid, 8);
    assert!(generated.properties.is_empty());
    assert_eq!(map.tile(6).map(|t| t.drawing_rect), Some(Rect::from_xywh(16, 16, 16, 16)));

    let wangset = terrain.get_wangset("paths").expect("wang set");
    assert_eq!(wangset.wang_tiles.len(), 1);
    assert_eq!(wangset.get_color("Red").map(|c| c.color), Some(Color::from_argb(255, 255, 0, 0)));

    let items = map.get_tileset("items").expect("external tileset");
    assert_eq!(items.source, Some(PathBuf::from("items.json")));
    assert_eq!(items.firstgid, 9);
    assert_eq!(items.tileset_type, TilesetType::ImageCollection);
    assert!(items.grid.is_some());

    let coin = map.tile(10).expect("coin tile");
    assert_eq!(coin.id, 2);
    assert_eq!(coin.tileset, 1);
    assert_eq!(coin.image, PathBuf::from("items/coin.png"));
    assert_eq!(coin.drawing_rect, Rect::from_xywh(0, 0, 16, 16));

    assert_eq!(map.get_tileset_by_gid(9).map(|t| t.name.as_str()), Some("items"));
    assert!(map.get_tileset_by_gid(11).is_none());
    // 10 tileset tiles and one flipped copy
    assert_eq!(map.tile_map().len(), 11);
}

#[test]
fn load_ultimate_map_tile_layers() {
    let map = load_ultimate_map();

    let ground = map.get_layer("ground").expect("ground layer");
    let compressed = map.get_layer("compressed").expect("compressed layer");
    assert_eq!(compressed.opacity, 0.5);

    let ground_tiles = ground.as_tile_layer().expect("tile layer");
    let compressed_tiles = compressed.as_tile_layer().expect("tile layer");
    assert_eq!(ground_tiles.data, vec![1, 2, 3, 0x80000001, 5, 0]);
    assert_eq!(compressed_tiles.data, vec![1, 2, 3, 0x80000001, 5, 6]);
    assert_eq!(compressed_tiles.encoding, "base64");
    assert_eq!(compressed_tiles.compression, "zlib");
    assert!(!compressed_tiles.base64_data.is_empty());

    assert!(map.tile_at(ground, 2, 1).is_none());
    assert_eq!(map.tile_at(compressed, 2, 1).map(|t| t.gid), Some(6));
    assert_eq!(map.tile_at(ground, 1, 0).map(|t| t.gid), Some(2));

    let flipped = map.tile_at(ground, 0, 1).expect("flipped tile");
    assert_eq!(flipped.gid, 1);
    assert!(flipped.has_flip_flags(TileFlipFlags::HORIZONTAL));
    assert!(!flipped.has_flip_flags(TileFlipFlags::VERTICAL));
    assert_eq!(ground_tiles.unique_flagged_tiles().iter().copied().collect::<Vec<_>>(), vec![0x80000001]);

    let object = ground.get_tile_object(2, 0).expect("tile object");
    assert_eq!(object.position_in_tile_units, ivec2::new(2, 0));
    assert_eq!(object.position, fvec2::new(32., 0.));
    assert_eq!(object.drawing_rect, Rect::from_xywh(32, 0, 16, 16));
    assert!(ground.get_tile_object(2, 1).is_none());
}

#[test]
fn tile_data_lookup_does_not_insert() {
    let mut map = load_ultimate_map();
    let layer = map.layers[0].as_tile_layer_mut().expect("tile layer");
    assert_eq!(layer.tile_data().len(), 5);

    assert_eq!(layer.get_tile_data(2, 1), None);
    assert_eq!(layer.get_tile_data(100, 100), None);
    assert_eq!(layer.tile_data().len(), 5);

    assert_eq!(*layer.tile_data_entry(2, 1), None);
    assert_eq!(layer.tile_data().len(), 6);
    assert!(layer.tile_data().contains_key(&(2, 1)));
}

#[test]
fn load_ultimate_map_objects() {
    let map = load_ultimate_map();
    let layer = map.get_layer("objects").expect("object layer");
    assert_eq!(layer.as_object_layer().map(|o| o.draw_order), Some(DrawOrder::Index));
    assert_eq!(layer.objects().len(), 3);

    // everything but the position comes from the template
    let door = layer.get_obj(1).expect("door");
    assert_eq!(door.object_type, ObjectType::Template);
    assert_eq!(door.template, "door.tx");
    assert_eq!(door.name, "door");
    assert_eq!(door.type_, "door");
    assert_eq!(door.position, fvec2::new(16., 32.));
    assert_eq!(door.size, fvec2::new(16., 32.));
    assert!(door.visible);
    assert!(!door.properties.get_value::<bool>("locked"));
    assert_eq!(door.properties.get_value::<String>("key"), "golden");

    let locked = layer.first_obj("locked door").expect("locked door");
    assert_eq!(locked.id, 2);
    assert!(locked.properties.get_value::<bool>("locked"));
    assert_eq!(locked.properties.get_value::<String>("key"), "golden");
    assert_eq!(locked.properties.len(), 2);

    let coin = layer.first_obj("coin").expect("coin");
    assert_eq!(coin.object_type, ObjectType::Object);
    assert_eq!(coin.gid, 10);
    assert_eq!(map.tile(coin.gid).map(|t| t.id), Some(2));

    assert_eq!(layer.objects_by_type(ObjectType::Template).len(), 2);
    assert_eq!(layer.objects_by_name("door").len(), 1);
}

#[test]
fn load_ultimate_map_groups() {
    let map = load_ultimate_map();
    let names: Vec<_> = map.iter_layers().map(|(l, _)| l.name.as_str()).collect();
    assert_eq!(names, ["ground", "compressed", "objects", "background", "sky"]);

    let group = map.get_layer("background").expect("group");
    assert_eq!(group.layer_type(), LayerType::Group);
    assert_eq!(group.layers().len(), 1);
    assert_eq!(group.opacity, 0.8);

    let sky = map.get_layer("sky").expect("nested image layer");
    assert!(!sky.visible);
    assert_eq!(sky.offset, fvec2::new(4., -2.));
    assert_eq!(sky.parallax, fvec2::new(0.5, 1.));
    assert_eq!(sky.tint_color, Color::from_argb(255, 255, 0, 0));

    let image = sky.as_image_layer().expect("image layer");
    assert_eq!(image.image, PathBuf::from("background.png"));
    assert!(image.repeat_x);
    assert!(!image.repeat_y);
}

#[test]
fn load_compressed_map_from_memory() -> Result<()> {
    let data = std::fs::read("test-maps/ultimate_test.json")?;
    let mut encoder = libflate::gzip::Encoder::new(Vec::new())?;
    encoder.write_all(&data)?;
    let compressed = encoder.finish().into_result()?;

    let mut parser = Tileson::new();
    parser.resources_mut().set_base_path("test-maps");
    let map = parser.parse_bytes_with(&compressed, &GzipDecompressor);
    assert_eq!(map.status(), ParseStatus::Ok, "{}", map.status_message());
    assert_eq!(map.tilesets.len(), 2);
    assert_eq!(map.get_layer("objects").map(|l| l.objects().len()), Some(3));
    Ok(())
}

#[test]
fn maps_without_codecs_keep_encoded_data_empty() {
    let map = Tileson::without_default_codecs().parse(Path::new("test-maps/ultimate_test.json"));
    assert_eq!(map.status(), ParseStatus::Ok, "{}", map.status_message());

    let compressed = map.get_layer("compressed").and_then(Layer::as_tile_layer).expect("tile layer");
    assert!(compressed.data.is_empty());
    assert!(compressed.tile_data().is_empty());
}

#[test]
fn missing_required_field() {
    let map = Tileson::new().parse(Path::new("test-maps/broken_map.json"));
    assert_eq!(map.status(), ParseStatus::ParseError);
    assert!(map.status_message().contains("tiledversion"), "{}", map.status_message());
    assert!(map.layers.is_empty());
}

#[test]
fn missing_external_tileset() {
    let map = Tileson::new().parse(Path::new("test-maps/missing_tileset.json"));
    assert_eq!(map.status(), ParseStatus::ParseError);
    assert!(map.status_message().contains("does_not_exist.json"), "{}", map.status_message());
}

#[test]
fn load_map_with_project() -> Result<()> {
    let project = Rc::new(Project::from_file(Path::new("test-maps/project/test.tiled-project"))?);
    assert_eq!(project.data().extensions_path, "extensions");
    assert_eq!(project.property_types().enums().len(), 2);
    assert_eq!(project.property_types().classes().len(), 2);

    let map = Tileson::new().with_project(&project).parse(Path::new("test-maps/project/level.json"));
    assert_eq!(map.status(), ParseStatus::Ok, "{}", map.status_message());
    assert!(map.project().is_some());

    let difficulty = map.properties.get_value::<EnumValue>("difficulty");
    assert_eq!(difficulty.value_name(), "Hard");

    let level = map.class().expect("level class");
    assert_eq!(level.name, "Level");
    assert_eq!(level.get::<String>("name"), "Caves");
    assert_eq!(level.get::<i32>("time_limit"), 300);
    assert_eq!(level.get::<EnumValue>("difficulty").value_name(), "Hard");
    // the class is built once and cached
    assert!(std::ptr::eq(level, map.class().expect("cached class")));

    let player = map.get_layer("actors").and_then(|l| l.first_obj("player")).expect("player");
    let hero = player.class().expect("hero class");
    assert_eq!(hero.get::<i32>("hp"), 25);
    let powers = hero.get::<EnumValue>("powers");
    assert_eq!(powers.value_names(), ["Fly", "Climb"]);
    assert!(powers.has_flag_value(4));
    assert!(!powers.has_flag_value(2));

    drop(project);
    assert!(map.project().is_none());
    Ok(())
}

#[test]
fn load_map_without_project() {
    let map = Tileson::new().parse(Path::new("test-maps/project/level.json"));
    assert_eq!(map.status(), ParseStatus::Ok, "{}", map.status_message());
    assert!(map.class().is_none());

    let difficulty = map.properties.get_property("difficulty").expect("property");
    assert_eq!(difficulty.type_, PropertyType::String);
    assert_eq!(difficulty.property_type, "Difficulty");
    assert_eq!(difficulty.get::<String>().as_deref(), Some("Hard"));
}

#[test]
fn load_world_maps() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let map = |width: i32| format!(
        r#"{{"width": {}, "height": 1, "tilewidth": 16, "tileheight": 16, "orientation": "orthogonal",
            "nextobjectid": 1, "tiledversion": "1.10.2", "type": "map", "layers": [], "tilesets": []}}"#,
        width
    );
    std::fs::write(dir.path().join("w1.json"), map(1))?;
    std::fs::write(dir.path().join("w2.json"), map(2))?;
    std::fs::write(dir.path().join("w3.json"), map(3))?;

    let world_path = dir.path().join("test.world");
    std::fs::write(&world_path, r#"{
        "maps": [
            {"fileName": "w1.json", "height": 16, "width": 16, "x": 0, "y": 0},
            {"fileName": "w2.json", "height": 16, "width": 32, "x": 16, "y": 0},
            {"fileName": "w3.json", "height": 16, "width": 48, "x": 48, "y": 0},
            {"fileName": "w4.json", "height": 16, "width": 16, "x": 96, "y": 0}
        ],
        "onlyShowAdjacentMaps": true,
        "type": "world"
    }"#)?;

    let mut world = World::from_file(&world_path)?;
    assert_eq!(world.map_data().len(), 4);
    assert!(world.only_show_adjacent_maps());
    assert_eq!(world.get("w3.json").map(|m| m.position), Some(ivec2::new(48, 0)));

    let loaded = world.load_maps(&mut Tileson::new());
    assert_eq!(loaded, 3);
    assert_eq!(world.map_data().len(), 4);
    let widths: Vec<_> = world.maps().iter().map(|m| m.size.x).collect();
    assert_eq!(widths, [1, 2, 3]);
    assert!(world.maps().iter().all(|m| m.status() == ParseStatus::Ok));
    Ok(())
}
