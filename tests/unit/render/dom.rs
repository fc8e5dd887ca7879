use super::*;
use crate::foundation::core::Rgba8Premul;
use crate::render::markup::Element;
use crate::scene::image::{FrameAtlas, ImageHandle};
use crate::scene::model::DisplayNode;

fn img(src: &str, w: u32, h: u32) -> ImageHandle {
    ImageHandle::solid(src, w, h, Rgba8Premul::transparent()).unwrap()
}

fn live(root: DisplayNode) -> DomRenderer<DisplayNode> {
    let mut r = DomRenderer::new(RenderSettings::default());
    r.get_surface(Some(100), Some(50)).unwrap();
    r.set_root(root);
    r.update(None).unwrap();
    r
}

fn surface_root(r: &DomRenderer<DisplayNode>) -> &Element {
    r.surface().unwrap().content().root().unwrap()
}

#[test]
fn surface_wrapper_carries_size() {
    let r = live(DisplayNode::container(vec![]));
    let root = surface_root(&r);
    assert_eq!(root.tag, "div");
    assert_eq!(
        root.attr("style"),
        Some("position:relative;overflow:hidden;width:100px;height:50px")
    );
    assert!(root.children.is_empty());
}

#[test]
fn leaves_get_increasing_z_index_and_snapped_matrix() {
    let root = DisplayNode::container(vec![
        DisplayNode::bitmap(img("a.png", 4, 4)).at(10.4, 20.5),
        DisplayNode::bitmap(img("b.png", 2, 3)).at(1.0, 2.0).with_alpha(0.5),
    ]);
    let r = live(root);
    let kids = &surface_root(&r).children;
    assert_eq!(kids.len(), 2);

    assert_eq!(kids[0].tag, "img");
    assert_eq!(kids[0].attr("src"), Some("a.png"));
    assert_eq!(kids[0].attr("width"), Some("4"));
    let s0 = kids[0].attr("style").unwrap();
    assert!(s0.contains("z-index:1;"), "{s0}");
    assert!(s0.contains("transform:matrix(1,0,0,1,10,21)"), "{s0}");
    assert!(!s0.contains("opacity"));

    let s1 = kids[1].attr("style").unwrap();
    assert!(s1.contains("z-index:2;"), "{s1}");
    assert!(s1.ends_with(";opacity:0.5"), "{s1}");
}

#[test]
fn scaled_leaf_keeps_fractional_translation() {
    let r = live(DisplayNode::bitmap(img("a.png", 4, 4)).at(10.4, 0.0).with_scale(2.0, 2.0));
    let s = surface_root(&r).children[0].attr("style").unwrap().to_owned();
    assert!(s.contains("matrix(2,0,0,2,10.4,0)"), "{s}");
}

#[test]
fn sprite_frames_become_background_divs() {
    let sheet = img("sheet.png", 20, 10);
    let atlas = FrameAtlas::from_grid(&sheet, 10, 10).unwrap();
    let mut node = DisplayNode::sprite(atlas);
    node.goto_frame(1);
    let r = live(node);
    let div = &surface_root(&r).children[0];
    assert_eq!(div.tag, "div");
    let s = div.attr("style").unwrap();
    assert!(s.contains("width:10px;height:10px"), "{s}");
    assert!(s.contains("background-image:url('sheet.png')"), "{s}");
    assert!(s.contains("background-position:-10px 0px"), "{s}");
}

#[test]
fn render_replaces_previous_content() {
    let mut r: DomRenderer<DisplayNode> = DomRenderer::new(RenderSettings::default());
    r.get_surface(Some(10), Some(10)).unwrap();
    let root = DisplayNode::bitmap(img("a.png", 1, 1));
    r.render_root(&root).unwrap();
    r.render_root(&root).unwrap();
    assert_eq!(surface_root(&r).children.len(), 1);

    r.clear().unwrap();
    assert!(surface_root(&r).children.is_empty());
}

#[test]
fn string_variant_matches_live_variant() {
    let scene = DisplayNode::container(vec![
        DisplayNode::bitmap(img("a.png", 4, 4)).at(3.0, 4.0).with_rotation(30.0),
        DisplayNode::bitmap(img("b.png", 4, 4)).with_alpha(0.25),
    ]);
    let live_r = live(scene.clone());

    let mut s: DomStringRenderer<DisplayNode> = DomRenderer::new(RenderSettings::default());
    s.get_surface(Some(100), Some(50)).unwrap();
    s.render_root(&scene).unwrap();

    assert_eq!(s.surface().unwrap().content().as_str(), surface_root(&live_r).to_markup());
}
