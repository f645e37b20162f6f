use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// Terminal client for a song server exposing `/songs` and `/audio/<file>`.
#[derive(Debug, Parser)]
#[command(name = "stream-player", version, about)]
pub struct Args {
    /// Base URL of the song server
    #[arg(long, env = "STREAM_PLAYER_SERVER", default_value = "http://127.0.0.1:5000")]
    pub server: String,

    /// Path on the server holding cover images
    #[arg(long, default_value = "/static/images")]
    pub images: String,

    /// Where to write the log (the terminal belongs to the UI)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Frame ticks per second
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=120))]
    pub fps: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: String,
    pub images_dir: String,
    pub log_file: PathBuf,
    pub tick_rate: Duration,
}

impl Config {
    pub fn from_args(args: Args) -> Self {
        let log_file = args
            .log_file
            .unwrap_or_else(|| std::env::temp_dir().join("stream-player.log"));
        Config {
            server: args.server.trim_end_matches('/').to_string(),
            images_dir: args.images.trim_end_matches('/').to_string(),
            log_file,
            tick_rate: Duration::from_secs(1) / args.fps.max(1),
        }
    }

    pub fn default_image(&self) -> String {
        format!("{}/default.jpg", self.images_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_flask_dev_server() {
        let config = Config::from_args(Args::parse_from(["stream-player"]));
        assert_eq!(config.server, "http://127.0.0.1:5000");
        assert_eq!(config.images_dir, "/static/images");
        assert_eq!(config.default_image(), "/static/images/default.jpg");
        assert_eq!(config.tick_rate, Duration::from_secs(1) / 30);
    }

    #[test]
    fn trailing_slashes_are_dropped() {
        let config = Config::from_args(Args::parse_from([
            "stream-player",
            "--server",
            "http://music.local:8080/",
            "--images",
            "/art/",
        ]));
        assert_eq!(config.server, "http://music.local:8080");
        assert_eq!(config.default_image(), "/art/default.jpg");
    }

    #[test]
    fn zero_fps_is_rejected() {
        assert!(Args::try_parse_from(["stream-player", "--fps", "0"]).is_err());
    }
}
