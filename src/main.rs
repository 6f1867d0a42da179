//! Model viewer
//!
//! `raster-engine <model.obj> [--config file.ron] [--output frame.png]`
//!
//! With `--output` one frame is rendered headless and written as PNG.
//! Otherwise the model spins in a window until Escape is pressed.

use std::path::PathBuf;
use std::process::ExitCode;

use glam::Vec3;
use log::{error, info};
use macroquad::prelude::{
    draw_texture_ex, get_frame_time, is_key_pressed, next_frame, screen_height, screen_width, vec2, Conf,
    DrawTextureParams, FilterMode, KeyCode, Texture2D, WHITE,
};

use raster_engine::config::{load_config, RenderConfig};
use raster_engine::rasterizer::model_matrix;
use raster_engine::resource::Handle;
use raster_engine::{ModelLoader, Renderer, VERSION};

const USAGE: &str = "usage: raster-engine <model.obj> [--config file.ron] [--output frame.png]";

struct Args {
    model: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut model = None;
        let mut config: Option<PathBuf> = None;
        let mut output: Option<PathBuf> = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => config = Some(args.next().ok_or("--config needs a file")?.into()),
                "--output" => output = Some(args.next().ok_or("--output needs a file")?.into()),
                flag if flag.starts_with("--") => return Err(format!("unknown option {}", flag)),
                _ if model.is_none() => model = Some(PathBuf::from(&arg)),
                _ => return Err(format!("unexpected argument {}", arg)),
            }
        }

        Ok(Self {
            model: model.ok_or("no model given")?,
            config,
            output,
        })
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}\n{}", msg, USAGE);
            return ExitCode::from(2);
        }
    };

    let config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => RenderConfig::default(),
    };

    let mut renderer = Renderer::with_settings(config.width, config.height, config.raster);
    let model = match renderer.add_model(&args.model) {
        Ok(handle) => handle,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(output) = &args.output {
        renderer.begin_frame(config.clear_color);
        let written = renderer.render_scene(&config.camera());
        if let Err(e) = renderer.framebuffer().save_png(output) {
            error!("Failed to write {}: {}", output.display(), e);
            return ExitCode::FAILURE;
        }
        info!("Wrote {} ({} pixels shaded)", output.display(), written);
        return ExitCode::SUCCESS;
    }

    let conf = Conf {
        window_title: format!("Raster Engine v{} - {}", VERSION, args.model.display()),
        window_width: config.width as i32,
        window_height: config.height as i32,
        window_resizable: true,
        ..Default::default()
    };
    macroquad::Window::from_config(conf, view(renderer, config, model));
    ExitCode::SUCCESS
}

async fn view(mut renderer: Renderer, config: RenderConfig, model: Handle<ModelLoader>) {
    let mut camera = config.camera();
    let mut angle = 0.0f32;

    // FPS counter
    let mut frames = 0u32;
    let mut elapsed = 0.0f32;

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        let width = screen_width() as usize;
        let height = screen_height() as usize;
        if width > 0 && height > 0 && (width, height) != renderer.viewport_size() {
            renderer.resize(width, height);
            camera.set_viewport(width, height);
        }

        let dt = get_frame_time();
        angle += config.spin_speed * dt;
        if let Ok(loader) = renderer.model_mut(model) {
            loader.set_model_matrix(model_matrix(Vec3::ZERO, Vec3::new(0.0, angle, 0.0), Vec3::ONE));
        }

        renderer.begin_frame(config.clear_color);
        renderer.render_scene(&camera);

        // Upload and stretch over the window
        let fb = renderer.framebuffer();
        let texture = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &fb.pixels);
        texture.set_filter(FilterMode::Nearest);
        draw_texture_ex(
            &texture,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(screen_width(), screen_height())),
                ..Default::default()
            },
        );

        frames += 1;
        elapsed += dt;
        if elapsed >= 1.0 {
            info!("{} fps ({}x{})", frames, fb.width, fb.height);
            frames = 0;
            elapsed = 0.0;
        }

        next_frame().await;
    }
}
