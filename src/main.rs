mod demo_scenes;

use std::sync::Arc;

use glam::{Mat4, UVec2, Vec3};
use log::{error, info, warn};

use brick_renderer::asset::{AssetCache, PartLibrary, Texture, TextureKey};
use brick_renderer::math::build_frustum_matrix;
use brick_renderer::renderer::{GpuContext, NullBackend, RenderBackend, WgpuBackend};
use brick_renderer::{DrawMode, RenderSettings, Renderer};
use demo_scenes::DemoScene;

const VIEWPORT: UVec2 = UVec2::new(1280, 720);
const ZOOM_LEVELS: [f32; 3] = [0.1, 1.0, 10.0];

fn create_backend(settings: &RenderSettings, checker: TextureKey) -> Box<dyn RenderBackend + Send> {
    match GpuContext::new_headless_blocking() {
        Ok(context) => {
            info!(
                "Using GPU adapter {} ({:?})",
                context.adapter_info.name, context.adapter_info.backend
            );
            let context = Arc::new(context);
            let mut backend = WgpuBackend::new(Arc::clone(&context), VIEWPORT, settings);
            let view = checker_texture(&context);
            backend.register_texture(checker, &view);
            Box::new(backend)
        }
        Err(err) => {
            warn!("No GPU adapter available ({}). Falling back to the null backend.", err);
            Box::new(NullBackend::new())
        }
    }
}

/// 2x2 black and white checkerboard.
fn checker_texture(context: &GpuContext) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: 2,
        height: 2,
        depth_or_array_layers: 1,
    };
    let texture = context.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("CheckerTexture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let texels: [u8; 16] = [
        255, 255, 255, 255, 0, 0, 0, 255, //
        0, 0, 0, 255, 255, 255, 255, 255,
    ];
    context.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &texels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * size.width),
            rows_per_image: Some(size.height),
        },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn projection() -> Mat4 {
    let near = 1.0;
    let top = near * 30f32.to_radians().tan();
    let right = top * VIEWPORT.x as f32 / VIEWPORT.y as f32;
    build_frustum_matrix(-right, right, -top, top, near, 20_000.0)
}

/// Orbiting camera at a fixed distance with the model scaled by `zoom`.
fn camera(zoom: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, 0.0, -600.0))
        * Mat4::from_rotation_x(200f32.to_radians())
        * Mat4::from_rotation_y(35f32.to_radians())
        * Mat4::from_scale(Vec3::splat(zoom))
}

fn main() {
    brick_renderer::init_logging();
    info!("Starting brick renderer demo");

    let settings = RenderSettings::load();
    let mut textures: AssetCache<Texture> = AssetCache::new();
    let checker = textures.insert(Texture);

    let mut renderer = Renderer::new(create_backend(&settings, checker), settings);
    renderer.initialize(VIEWPORT);
    let mut library = PartLibrary::new();

    for scene in DemoScene::ALL {
        let root = scene.build(&mut library, checker);
        for zoom in ZOOM_LEVELS {
            renderer.draw_drag_handle(Vec3::ZERO, 0.0);
            for mode in [DrawMode::Normal, DrawMode::BoundsOnly] {
                match renderer.render(&root, &camera(zoom), &projection(), mode) {
                    Ok(stats) => info!(
                        "{:?} at {:>5.1}x ({:?}): {} batches, {} draws, {} instances, {} triangles, {} culled",
                        scene,
                        zoom,
                        mode,
                        stats.batches,
                        stats.draw_calls,
                        stats.instances,
                        stats.triangles,
                        stats.culled_nodes
                    ),
                    Err(err) => error!("{:?} at {}x failed: {}", scene, zoom, err),
                }
            }
        }
    }

    info!("Demo complete");
}
