use super::*;
use crate::foundation::core::{Rect, Rgba8Premul};
use crate::scene::image::FrameAtlas;
use crate::scene::model::DisplayNode;

fn red(w: u32, h: u32) -> ImageHandle {
    ImageHandle::solid("red", w, h, Rgba8Premul::from_straight_rgba(255, 0, 0, 255)).unwrap()
}

fn renderer(root: DisplayNode) -> RasterRenderer<DisplayNode> {
    let mut r = RasterRenderer::new(RenderSettings::default());
    r.get_surface(Some(64), Some(64)).unwrap();
    r.set_root(root);
    r
}

fn painted(frame: &FrameRGBA) -> Option<Rect> {
    frame.bounds_where(|px| px[3] > 0)
}

#[test]
fn get_surface_creates_then_resizes_in_place() {
    let mut r: RasterRenderer<DisplayNode> = RasterRenderer::new(RenderSettings::default());
    assert_eq!(r.get_surface(None, None).unwrap().size(), SurfaceSize::new(640, 480));
    assert_eq!(r.get_surface(Some(32), None).unwrap().size(), SurfaceSize::new(32, 480));
    assert!(r.get_surface(Some(0), Some(10)).is_err());
    assert!(r.get_surface(Some(70_000), Some(10)).is_err());
}

#[test]
fn snapped_translation_paints_whole_pixels() {
    let mut r = renderer(DisplayNode::bitmap(red(4, 4)).at(10.4, 20.6));
    r.update(None).unwrap();
    let frame = r.to_frame().unwrap();
    assert_eq!(painted(&frame), Some(Rect::new(10.0, 21.0, 14.0, 25.0)));
    assert_eq!(frame.pixel(11, 22), Some([255, 0, 0, 255]));
}

#[test]
fn nested_opacity_multiplies() {
    let root = DisplayNode::container(vec![DisplayNode::bitmap(red(8, 8)).with_alpha(0.5)])
        .with_alpha(0.5);
    let mut r = renderer(root);
    r.update(None).unwrap();
    let px = r.to_frame().unwrap().pixel(4, 4).unwrap();
    assert!((i32::from(px[3]) - 64).abs() <= 2, "alpha was {}", px[3]);
}

#[test]
fn sprite_frame_paints_only_its_rect() {
    let sheet = red(20, 10);
    let atlas = FrameAtlas::from_grid(&sheet, 10, 10).unwrap();
    let mut node = DisplayNode::sprite(atlas).at(5.0, 5.0);
    node.goto_frame(1);
    let mut r = renderer(node);
    r.update(None).unwrap();
    assert_eq!(painted(&r.to_frame().unwrap()), Some(Rect::new(5.0, 5.0, 15.0, 15.0)));
}

#[test]
fn clear_color_fills_surface_and_draws_reset() {
    let settings = RenderSettings {
        clear_rgba: Some([0, 0, 255, 255]),
        ..RenderSettings::default()
    };
    let mut r: RasterRenderer<DisplayNode> = RasterRenderer::new(settings);
    r.get_surface(Some(8), Some(8)).unwrap();
    r.render_root(&DisplayNode::bitmap(red(2, 2))).unwrap();
    assert_eq!(r.to_frame().unwrap().pixel(0, 0), Some([255, 0, 0, 255]));

    r.clear().unwrap();
    let frame = r.to_frame().unwrap();
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(frame.pixel(7, 7), Some([0, 0, 255, 255]));
}

#[test]
fn render_without_surface_or_root_is_a_no_op() {
    let mut r: RasterRenderer<DisplayNode> = RasterRenderer::new(RenderSettings::default());
    r.render().unwrap();
    r.render_root(&DisplayNode::bitmap(red(1, 1))).unwrap();
    assert!(r.to_frame().is_none());
}
