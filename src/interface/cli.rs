use std::ffi::OsString;

use clap::{App, ArgMatches, Error, ErrorKind};

use crate::app::AppConfig;
use crate::scene::SceneKind;

/// Everything the command line can set.
#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub app: AppConfig,
    pub log_filter: Option<String>
}

pub fn parse() -> Result<CliOptions, Error> {
    parse_from(std::env::args_os())
}

pub fn parse_from<I, T>(args: I) -> Result<CliOptions, Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone
{
    let yaml = load_yaml!("cli.yaml");
    let matches = App::from_yaml(yaml).get_matches_from_safe(args)?;

    let mut app = AppConfig::default();

    if let Some(shader) = matches.value_of("shader") {
        app.shader = shader.into();
    }

    if let Some(texture) = matches.value_of("texture") {
        app.texture = texture.into();
    }

    if matches.is_present("scene") {
        app.scene = value_t!(matches, "scene", SceneKind)?;
    }

    if let Some(width) = dimension(&matches, "width")? {
        app.width = width;
    }

    if let Some(height) = dimension(&matches, "height")? {
        app.height = height;
    }

    if let Some(title) = matches.value_of("title") {
        app.title = title.to_string();
    }

    app.vsync = !matches.is_present("no-vsync");
    app.pulse = matches.is_present("pulse");

    Ok(CliOptions {
        app,
        log_filter: matches.value_of("log").map(String::from)
    })
}

fn dimension(matches: &ArgMatches, name: &str) -> Result<Option<u32>, Error> {
    if !matches.is_present(name) {
        return Ok(None);
    }

    match value_t!(matches, name, u32)? {
        0 => Err(Error::with_description(
            &format!("--{} must be at least 1 pixel", name),
            ErrorKind::InvalidValue
        )),
        n => Ok(Some(n))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn no_arguments_gives_defaults() {
        let options = parse_from(vec!["learngl"]).unwrap();

        assert_eq!(options.app, AppConfig::default());
        assert_eq!(options.log_filter, None);
    }

    #[test]
    fn reads_every_option() {
        let options = parse_from(vec![
            "learngl",
            "--shader", "res/shaders/Other.shader",
            "-t", "res/textures/other.png",
            "--scene", "cube",
            "--width", "800",
            "--height", "600",
            "--title", "cube",
            "--no-vsync",
            "--pulse",
            "--log", "learngl=debug"
        ]).unwrap();

        assert_eq!(options.app, AppConfig {
            shader: PathBuf::from("res/shaders/Other.shader"),
            texture: PathBuf::from("res/textures/other.png"),
            scene: SceneKind::Cube,
            width: 800,
            height: 600,
            title: String::from("cube"),
            vsync: false,
            pulse: true
        });
        assert_eq!(options.log_filter.as_deref(), Some("learngl=debug"));
    }

    #[test]
    fn rejects_unknown_scene() {
        assert!(parse_from(vec!["learngl", "--scene", "teapot"]).is_err());
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(parse_from(vec!["learngl", "--width", "wide"]).is_err());

        let err = parse_from(vec!["learngl", "--height", "0"]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidValue);
        assert!(err.message.contains("--height"));
    }
}
