use scenepaint::{
    DisplayNode, FrameAtlas, ImageHandle, RasterRenderer, RenderSettings, Renderer, Rgba8Premul,
    SvgStringRenderer,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let out_dir = std::env::args()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::PathBuf::from("target/scenepaint-demo"));
    std::fs::create_dir_all(&out_dir)?;

    let orange = Rgba8Premul::from_straight_rgba(240, 160, 0, 255);
    let blue = Rgba8Premul::from_straight_rgba(30, 90, 200, 255);
    let sheet = ImageHandle::solid("sheet.png", 64, 16, orange)?;
    let block = ImageHandle::solid("block.png", 24, 24, blue)?;

    let root = DisplayNode::container(vec![
        DisplayNode::bitmap(block.clone()).at(20.0, 20.0),
        DisplayNode::bitmap(block)
            .at(100.0, 60.0)
            .with_reg(12.0, 12.0)
            .with_rotation(30.0)
            .with_alpha(0.6),
        DisplayNode::sprite(FrameAtlas::from_grid(&sheet, 16, 16)?)
            .at(40.0, 100.0)
            .with_scale(2.0, 2.0)
            .playing(true),
    ]);
    let settings = RenderSettings {
        default_width: 160,
        default_height: 140,
        clear_rgba: Some([255, 255, 255, 255]),
        ..RenderSettings::default()
    };

    let mut raster: RasterRenderer<DisplayNode> = RasterRenderer::new(settings.clone());
    raster.get_surface(None, None)?;
    raster.set_root(root.clone());

    let mut svg: SvgStringRenderer<DisplayNode> = SvgStringRenderer::new(settings);
    svg.get_surface(None, None)?;
    svg.set_root(root);

    for frame in 0..4 {
        raster.update(None)?;
        svg.update(None)?;

        if let Some(pixels) = raster.to_frame() {
            let path = out_dir.join(format!("frame_{frame}.png"));
            pixels.to_rgba_image()?.save(&path)?;
        }
        if let Some(surface) = svg.surface() {
            let path = out_dir.join(format!("frame_{frame}.svg"));
            std::fs::write(path, surface.content().as_str())?;
        }
    }

    println!("wrote 4 frames to {}", out_dir.display());
    Ok(())
}
