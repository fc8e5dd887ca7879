use super::*;
use crate::foundation::core::Rgba8Premul;
use crate::render::markup::Element;
use crate::scene::image::{FrameAtlas, ImageHandle};
use crate::scene::model::DisplayNode;

fn img(src: &str, w: u32, h: u32) -> ImageHandle {
    ImageHandle::solid(src, w, h, Rgba8Premul::transparent()).unwrap()
}

fn live(root: &DisplayNode) -> SvgRenderer<DisplayNode> {
    let mut r = SvgRenderer::new(RenderSettings::default());
    r.get_surface(Some(120), Some(80)).unwrap();
    r.render_root(root).unwrap();
    r
}

fn svg_root(r: &SvgRenderer<DisplayNode>) -> &Element {
    r.surface().unwrap().content().root().unwrap()
}

fn sprite(frame: usize) -> DisplayNode {
    let sheet = img("sheet.png", 30, 10);
    let mut n = DisplayNode::sprite(FrameAtlas::from_grid(&sheet, 10, 10).unwrap());
    n.goto_frame(frame);
    n
}

#[test]
fn root_declares_namespaces_and_real_height() {
    let r = live(&DisplayNode::container(vec![]));
    let root = svg_root(&r);
    assert_eq!(root.tag, "svg");
    assert_eq!(root.attr("xmlns"), Some(SVG_NS));
    assert_eq!(root.attr("xmlns:xlink"), Some(XLINK_NS));
    assert_eq!(root.attr("width"), Some("120"));
    assert_eq!(root.attr("height"), Some("80"));
    assert!(root.find_all("defs").is_empty());
}

#[test]
fn translated_bitmaps_use_x_and_y() {
    let r = live(&DisplayNode::bitmap(img("a.png", 4, 5)).at(7.6, 3.0).with_alpha(0.5));
    let image = &svg_root(&r).children[0];
    assert_eq!(image.tag, "image");
    assert_eq!(image.attr("xlink:href"), Some("a.png"));
    assert_eq!(image.attr("x"), Some("8"));
    assert_eq!(image.attr("y"), Some("3"));
    assert_eq!(image.attr("width"), Some("4"));
    assert_eq!(image.attr("height"), Some("5"));
    assert_eq!(image.attr("opacity"), Some("0.5"));
    assert!(image.attr("transform").is_none());
}

#[test]
fn rotated_bitmaps_use_matrix() {
    let r = live(&DisplayNode::bitmap(img("a.png", 4, 4)).with_rotation(90.0));
    let image = &svg_root(&r).children[0];
    assert_eq!(image.attr("transform"), Some("matrix(0,1,-1,0,0,0)"));
    assert!(image.attr("x").is_none());
}

#[test]
fn sprite_clips_are_shared_per_size_and_emitted_last() {
    let root = DisplayNode::container(vec![sprite(0), sprite(2).at(20.0, 0.0)]);
    let r = live(&root);
    let svg = svg_root(&r);

    assert_eq!(svg.children.len(), 3);
    assert_eq!(svg.children[2].tag, "defs");
    let clips = svg.find_all("clipPath");
    assert_eq!(clips.len(), 1);
    assert_eq!(clips[0].attr("id"), Some("clip_0"));

    let g = &svg.children[1];
    assert_eq!(g.tag, "g");
    assert_eq!(g.attr("transform"), Some("translate(20,0)"));
    assert_eq!(g.attr("clip-path"), Some("url(#clip_0)"));
    let inner = &g.children[0];
    assert_eq!(inner.attr("x"), Some("-20"));
    assert_eq!(inner.attr("width"), Some("30"));
}

#[test]
fn clip_registry_resets_between_renders() {
    let mut r: SvgStringRenderer<DisplayNode> = SvgRenderer::new(RenderSettings::default());
    r.get_surface(Some(10), Some(10)).unwrap();
    let root = sprite(0);
    r.render_root(&root).unwrap();
    r.render_root(&root).unwrap();
    let text = r.surface().unwrap().content().as_str().to_owned();
    assert_eq!(text.matches("<clipPath").count(), 1);
    assert_eq!(text.matches("<svg").count(), 1);
    assert_eq!(text.matches("</svg>").count(), 1);
}
