use super::*;
use crate::foundation::core::{Point, Rgba8Premul};
use crate::scene::image::FrameAtlas;
use crate::scene::model::DisplayNode;

#[derive(Default)]
struct Recorder {
    leaves: Vec<(String, Transform2D)>,
}

impl LeafSink for Recorder {
    fn paint_leaf(&mut self, leaf: Leaf<'_>, world: &Transform2D) -> PaintResult<()> {
        let tag = match leaf {
            Leaf::Bitmap(i) => format!("bitmap:{}", i.src()),
            Leaf::Frame(f) => format!("frame:{}@{}", f.image.src(), f.rect.x),
            Leaf::Cached { cache_id, .. } => format!("cached:{cache_id}"),
        };
        self.leaves.push((tag, *world));
        Ok(())
    }
}

fn img(src: &str) -> ImageHandle {
    ImageHandle::solid(src, 4, 4, Rgba8Premul::transparent()).unwrap()
}

fn run(root: &DisplayNode, pool: &mut TransformPool) -> Recorder {
    let mut r = Recorder::default();
    traverse(root, &Transform2D::identity(), pool, &mut r).unwrap();
    r
}

#[test]
fn paints_leaves_in_child_order_and_skips_hidden() {
    let root = DisplayNode::container(vec![
        DisplayNode::bitmap(img("a")),
        DisplayNode::bitmap(img("hidden")).hidden(),
        DisplayNode::container(vec![DisplayNode::bitmap(img("b"))]),
        DisplayNode::bitmap(img("c")),
    ]);
    let r = run(&root, &mut TransformPool::new());
    let tags: Vec<&str> = r.leaves.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(tags, vec!["bitmap:a", "bitmap:b", "bitmap:c"]);
}

#[test]
fn opacity_multiplies_down_the_tree() {
    let root = DisplayNode::container(vec![DisplayNode::bitmap(img("a")).with_alpha(0.5)])
        .with_alpha(0.5);
    let r = run(&root, &mut TransformPool::new());
    assert_eq!(r.leaves[0].1.alpha, 0.25);
}

#[test]
fn child_offset_follows_parent_rotation() {
    let root = DisplayNode::container(vec![DisplayNode::bitmap(img("a")).at(10.0, 0.0)])
        .with_rotation(90.0);
    let r = run(&root, &mut TransformPool::new());
    let p: Point = r.leaves[0].1.transform_point(0.0, 0.0);
    assert!(p.x.abs() < 1e-9);
    assert!((p.y - 10.0).abs() < 1e-9);
}

#[test]
fn missing_sprite_frames_are_skipped() {
    let sheet = img("sheet");
    let atlas = FrameAtlas::from_grid(&sheet, 2, 2).unwrap();
    let mut far = DisplayNode::sprite(atlas.clone());
    far.goto_frame(99);
    let mut second = DisplayNode::sprite(atlas);
    second.goto_frame(1);
    let root = DisplayNode::container(vec![far, second]);

    let r = run(&root, &mut TransformPool::new());
    assert_eq!(r.leaves.len(), 1);
    assert_eq!(r.leaves[0].0, "frame:sheet@2");
}

#[test]
fn cached_subtree_replaces_children() {
    let mut group = DisplayNode::container(vec![DisplayNode::bitmap(img("inner"))]);
    let id = group.set_cache(img("cache"));
    let r = run(&DisplayNode::container(vec![group]), &mut TransformPool::new());
    assert_eq!(r.leaves.len(), 1);
    assert_eq!(r.leaves[0].0, format!("cached:{id}"));
}

#[test]
fn pool_reaches_steady_state_after_first_frame() {
    let root = DisplayNode::container(vec![
        DisplayNode::container(vec![DisplayNode::bitmap(img("a")), DisplayNode::bitmap(img("b"))]),
        DisplayNode::bitmap(img("c")),
    ]);
    let mut pool = TransformPool::new();
    run(&root, &mut pool);
    let warm = pool.stats();
    assert_eq!(warm.allocated, 3);
    assert_eq!(warm.available, warm.allocated);

    for _ in 0..5 {
        run(&root, &mut pool);
    }
    assert_eq!(pool.stats(), warm);
}

#[test]
fn leaf_source_rect_covers_whole_bitmap() {
    let i = img("a");
    assert_eq!(Leaf::Bitmap(&i).source_rect(), FrameRect::new(0.0, 0.0, 4.0, 4.0));
}
