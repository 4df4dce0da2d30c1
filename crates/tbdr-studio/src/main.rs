use anyhow::{Context, Result};

use tbdr_engine::cmdlist::ListType;
use tbdr_engine::coords::{Matrix, Rect};
use tbdr_engine::device::{DeviceInit, FrameHint, RecordingDriver};
use tbdr_engine::logging::{LoggingConfig, init_logging};
use tbdr_engine::paint::{BitmapCol, PackedCol};
use tbdr_engine::render::{FogMode, Gfx, MatrixType, VertexFormat, VertexTextured};
use tbdr_engine::texture::{Bitmap, TextureFlags, TextureHandle};

const FRAMES: usize = 4;

/// Rows of ground tiles drawn each frame; halved when the hardware overflows.
const INITIAL_VIEW_DISTANCE: usize = 32;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let init = DeviceInit::default();
    let (width, height) = init.framebuffer;
    let mut gfx = Gfx::create(init, RecordingDriver::new());

    let ground = load_checker(&mut gfx, 64).context("creating ground texture")?;
    let glass = load_gradient(&mut gfx, 32).context("creating glass texture")?;

    let proj = gfx.calc_perspective_matrix(70f32.to_radians(), width as f32 / height as f32, 256.0);
    gfx.load_matrix(MatrixType::Projection, &proj);
    let mut view = Matrix::IDENTITY;
    view.row4.y = -1.5;
    gfx.load_matrix(MatrixType::View, &view);

    gfx.set_vertex_format(VertexFormat::Textured);
    gfx.set_depth_test(true);
    gfx.set_fog_mode(FogMode::Linear);
    gfx.set_fog_end(128.0);
    gfx.set_fog_color(PackedCol::new(0x80, 0xA0, 0xFF, 0xFF));
    gfx.clear_color(PackedCol::new(0x80, 0xA0, 0xFF, 0xFF));

    let mut view_distance = INITIAL_VIEW_DISTANCE;

    for frame in 0..FRAMES {
        if gfx.begin_frame() == FrameHint::ReduceWorkingSet {
            view_distance = (view_distance / 2).max(1);
            log::info!("reducing view distance to {} rows", view_distance);
        }

        gfx.set_scissor(Rect::full(width, height));
        gfx.set_fog(true);
        gfx.bind_texture(Some(ground));
        let mut drawn = 0;
        for row in 0..view_distance {
            drawn += gfx.draw_quads(&ground_row(row));
        }

        gfx.set_fog(false);
        gfx.set_alpha_blend(true);
        gfx.bind_texture(Some(glass));
        drawn += gfx.draw_quads(&billboard(0.0, -6.0));
        gfx.set_alpha_blend(false);

        // Pretend the chip ran out of binning memory on the second frame.
        if frame == 1 {
            gfx.driver_mut().raise_param_overflow();
        }
        gfx.end_frame();

        let d = gfx.driver();
        log::info!(
            "frame {}: {} quads, OP {} / PT {} / TR {} records",
            frame,
            drawn,
            d.records_for(ListType::Opaque).len(),
            d.records_for(ListType::Punchthrough).len(),
            d.records_for(ListType::Translucent).len(),
        );
        gfx.driver_mut().clear_log();
    }

    print!("{}", gfx.api_info());

    gfx.delete_texture(glass).context("deleting glass texture")?;
    gfx.delete_texture(ground).context("deleting ground texture")?;
    gfx.free();
    Ok(())
}

fn load_checker(gfx: &mut Gfx<RecordingDriver>, size: u32) -> Result<TextureHandle> {
    let light = BitmapCol::new(0x60, 0xC0, 0x40, 0xFF);
    let dark = BitmapCol::new(0x40, 0x90, 0x30, 0xFF);
    let pixels: Vec<_> = (0..size * size)
        .map(|i| if ((i % size) / 8 + (i / size) / 8) % 2 == 0 { light } else { dark })
        .collect();
    Ok(gfx.alloc_texture(&Bitmap::new(&pixels, size, size), TextureFlags::empty(), false)?)
}

fn load_gradient(gfx: &mut Gfx<RecordingDriver>, size: u32) -> Result<TextureHandle> {
    let pixels: Vec<_> = (0..size * size)
        .map(|i| {
            let t = ((i % size) * 255 / (size - 1)) as u8;
            BitmapCol::new(t, t, 0xFF, 0x80)
        })
        .collect();
    Ok(gfx.alloc_texture(&Bitmap::new(&pixels, size, size), TextureFlags::BILINEAR, false)?)
}

fn ground_row(row: usize) -> Vec<VertexTextured> {
    let col = PackedCol::WHITE;
    let z0 = -(row as f32) - 1.0;
    let z1 = z0 - 1.0;
    (-8..8)
        .flat_map(|x| {
            let x0 = x as f32;
            let x1 = x0 + 1.0;
            [
                VertexTextured { x: x0, y: 0.0, z: z0, col, u: 0.0, v: 0.0 },
                VertexTextured { x: x1, y: 0.0, z: z0, col, u: 1.0, v: 0.0 },
                VertexTextured { x: x1, y: 0.0, z: z1, col, u: 1.0, v: 1.0 },
                VertexTextured { x: x0, y: 0.0, z: z1, col, u: 0.0, v: 1.0 },
            ]
        })
        .collect()
}

fn billboard(x: f32, z: f32) -> [VertexTextured; 4] {
    let col = PackedCol::new(0xFF, 0xFF, 0xFF, 0x80);
    [
        VertexTextured { x: x - 1.0, y: 2.0, z, col, u: 0.0, v: 0.0 },
        VertexTextured { x: x + 1.0, y: 2.0, z, col, u: 1.0, v: 0.0 },
        VertexTextured { x: x + 1.0, y: 0.0, z, col, u: 1.0, v: 1.0 },
        VertexTextured { x: x - 1.0, y: 0.0, z, col, u: 0.0, v: 1.0 },
    ]
}
