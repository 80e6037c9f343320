use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use shadowbox::AppConfig;

#[derive(Parser)]
#[command(name = "shadowbox", about = "Shadow-mapped demo scene with an orbit camera")]
struct Cli {
    /// Window width in logical pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Window height in logical pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Window title
    #[arg(long, default_value = "shadowbox")]
    title: String,

    /// Load textures from this directory instead of generating them
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Read .wgsl programs from this directory instead of the built-in ones
    #[arg(long)]
    shaders: Option<PathBuf>,

    /// Shadow map edge length in pixels
    #[arg(long, default_value_t = shadowbox::DEFAULT_SHADOW_SIZE)]
    shadow_size: u32,

    /// Hide the tunables overlay
    #[arg(long)]
    no_ui: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(self) -> AppConfig {
        let mut config = AppConfig::new()
            .title(self.title)
            .size(self.width, self.height)
            .shadow_size(self.shadow_size)
            .overlay(!self.no_ui);
        if let Some(dir) = self.assets {
            config = config.assets(dir);
        }
        if let Some(dir) = self.shaders {
            config = config.shaders(dir);
        }
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match shadowbox::run(cli.config()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
