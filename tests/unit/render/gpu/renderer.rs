use super::headless::HeadlessDevice;
use super::*;
use crate::foundation::core::Rgba8Premul;
use crate::scene::image::FrameAtlas;
use crate::scene::model::DisplayNode;

fn solid(w: u32, h: u32) -> ImageHandle {
    ImageHandle::solid("solid", w, h, Rgba8Premul::from_straight_rgba(0, 255, 0, 255)).unwrap()
}

fn renderer(limits: BatchLimits) -> GpuRenderer<DisplayNode, HeadlessDevice> {
    let mut r = GpuRenderer::new(HeadlessDevice::new(), RenderSettings::default(), limits);
    r.get_surface(Some(32), Some(32)).unwrap();
    r
}

#[test]
fn device_is_initialized_lazily_once() {
    let mut r = renderer(BatchLimits::default());
    assert_eq!(r.device().init_calls(), 0);
    r.clear().unwrap();
    r.render_root(&DisplayNode::bitmap(solid(2, 2))).unwrap();
    assert_eq!(r.device().init_calls(), 1);
    assert_eq!(r.device().size(), SurfaceSize::new(32, 32));
}

#[test]
fn failed_initialization_is_sticky() {
    let mut r: GpuRenderer<DisplayNode, _> = GpuRenderer::new(
        HeadlessDevice::failing("no adapter"),
        RenderSettings::default(),
        BatchLimits::default(),
    );
    r.get_surface(None, None).unwrap();
    assert!(r.clear().unwrap_err().is_init());
    let err = r.render_root(&DisplayNode::bitmap(solid(1, 1))).unwrap_err();
    assert!(err.is_init());
    assert!(err.to_string().contains("no adapter"));
    assert_eq!(r.device().init_calls(), 1);
    assert!(r.device().draws().is_empty());
}

#[test]
fn limits_are_clamped() {
    let r: GpuRenderer<DisplayNode, _> = GpuRenderer::new(
        HeadlessDevice::new(),
        RenderSettings::default(),
        BatchLimits {
            max_quads: 10,
            max_texture_slots: 64,
        },
    );
    assert_eq!(r.limits().max_texture_slots, 16);
}

#[test]
fn resize_after_init_reaches_device() {
    let mut r = renderer(BatchLimits::default());
    r.clear().unwrap();
    r.get_surface(Some(8), None).unwrap();
    assert_eq!(r.device().size(), SurfaceSize::new(8, 32));
    assert!(r.get_surface(Some(0), None).is_err());
}

#[test]
fn sprite_frame_maps_to_normalized_uv() {
    let atlas = FrameAtlas::from_grid(&solid(20, 10), 10, 10).unwrap();
    let mut node = DisplayNode::sprite(atlas).at(3.0, 4.0);
    node.goto_frame(1);

    let mut r = renderer(BatchLimits::default());
    r.render_root(&node).unwrap();
    let draws = r.device().draws();
    assert_eq!(draws.len(), 1);
    let v = &draws[0].vertices;
    assert_eq!(v[0].position, [3.0, 4.0, 0.0]);
    assert_eq!(v[2].position, [13.0, 14.0, 0.0]);
    assert_eq!(v[0].texcoord, [0.5, 0.0, 0.0]);
    assert_eq!(v[2].texcoord, [1.0, 1.0, 0.0]);
    assert_eq!(draws[0].index_count, 6);
}

#[test]
fn empty_pass_issues_no_draw() {
    let mut r = renderer(BatchLimits::default());
    r.render_root(&DisplayNode::container(Vec::new())).unwrap();
    assert!(r.device().draws().is_empty());
    assert_eq!(r.stats(), BatchStats::default());
}

#[test]
fn index_count_is_checked() {
    assert_eq!(index_count(3).unwrap(), 18);
    assert!(index_count(usize::MAX).is_err());
    assert!(index_count(u32::MAX as usize).is_err());
}
