use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::{Confirm, Input};

use media_embeds::config::{self, Config};
use media_embeds::core::http::ReqwestClient;
use media_embeds::core::thumbnail::LocalFileSystem;
use media_embeds::models::{MetadataAttribute, Thumbnail};
use media_embeds::sources::{build_source, MediaSource, SourceKind};

#[derive(Parser)]
#[command(
    name = "media-embeds",
    about = "Songwhip/Spotify/CodePen 임베드 메타데이터 조회 및 썸네일 미러링"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 소스 URL의 메타데이터를 표로 출력
    Fetch {
        /// 스트리밍 서비스 또는 임베드 페이지 URL
        url: String,
        /// 사용할 소스 (생략하면 URL로 판단)
        #[arg(long, value_enum)]
        source: Option<SourceKind>,
    },
    /// 메타데이터 속성 하나를 출력
    Get {
        url: String,
        /// 속성 이름 (name, url, image, releaseDate, type, default_name, thumbnail_uri ...)
        attribute: String,
        #[arg(long, value_enum)]
        source: Option<SourceKind>,
    },
    /// 썸네일을 로컬 디렉토리로 내려받고 경로를 출력
    Thumbnail {
        url: String,
        #[arg(long, value_enum)]
        source: Option<SourceKind>,
    },
    /// 설정 편집
    Config,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Fetch { url, source } => cmd_fetch(&url, source),
        Commands::Get {
            url,
            attribute,
            source,
        } => cmd_get(&url, &attribute, source),
        Commands::Thumbnail { url, source } => cmd_thumbnail(&url, source),
        Commands::Config => cmd_config(),
    }
}

fn open_source(url: &str, source: Option<SourceKind>) -> Result<Box<dyn MediaSource>> {
    let cfg = config::load_config();
    let kind = source.unwrap_or_else(|| SourceKind::detect(url));
    let http = Arc::new(ReqwestClient::new(&cfg.http.user_agent)?);

    Ok(build_source(kind, &cfg, http, Arc::new(LocalFileSystem)))
}

fn cmd_fetch(url: &str, source: Option<SourceKind>) -> Result<()> {
    let source = open_source(url, source)?;

    let mut table = Table::new();
    table.set_header(vec!["속성", "키", "값"]);

    let values = source
        .all_metadata(url)
        .with_context(|| format!("{} 메타데이터를 가져오지 못했습니다", source.name()))?;

    for ((attribute, label), (_, value)) in source.metadata_attributes().iter().zip(values) {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(attribute.key()),
            Cell::new(value.as_deref().unwrap_or("-")),
        ]);
    }

    println!("{} ({})", source.name(), url);
    println!("{table}");
    Ok(())
}

fn cmd_get(url: &str, attribute: &str, source: Option<SourceKind>) -> Result<()> {
    let Some(attribute) = MetadataAttribute::from_key(attribute) else {
        bail!("알 수 없는 속성입니다: {}", attribute);
    };

    let source = open_source(url, source)?;
    let value = source
        .metadata(url, attribute)
        .with_context(|| format!("{} 메타데이터를 가져오지 못했습니다", source.name()))?;

    match value {
        Some(value) => println!("{value}"),
        None => eprintln!("{} 속성 값이 없습니다", attribute.key()),
    }
    Ok(())
}

fn cmd_thumbnail(url: &str, source: Option<SourceKind>) -> Result<()> {
    let source = open_source(url, source)?;
    let thumbnail = source
        .thumbnail(url)
        .with_context(|| format!("{} 메타데이터를 가져오지 못했습니다", source.name()))?;

    match thumbnail {
        Thumbnail::Local(path) => println!("{}", path.display()),
        Thumbnail::NoImage => println!("썸네일 이미지가 없습니다."),
        Thumbnail::Failed(error) => {
            return Err(anyhow::Error::new(error).context("썸네일을 가져오지 못했습니다"))
        }
    }
    Ok(())
}

fn cmd_config() -> Result<()> {
    let mut cfg = config::load_config();

    println!("media-embeds 설정");
    println!("(파일: {})\n", config::config_path().display());

    let api_url: String = Input::new()
        .with_prompt("Songwhip API URL")
        .with_initial_text(cfg.songwhip.api_url.clone())
        .interact_text()?;

    let thumbnails_dir: String = Input::new()
        .with_prompt("썸네일 디렉토리 (비우면 기본값)")
        .with_initial_text(path_text(&cfg.thumbnails.directory))
        .allow_empty(true)
        .interact_text()?;

    let generate = Confirm::new()
        .with_prompt("썸네일을 자동으로 생성할까요?")
        .default(cfg.thumbnails.generate)
        .interact()?;

    let cache_dir: String = Input::new()
        .with_prompt("캐시 디렉토리 (비우면 기본값)")
        .with_initial_text(path_text(&cfg.cache.directory))
        .allow_empty(true)
        .interact_text()?;

    cfg.songwhip.api_url = api_url;
    cfg.thumbnails.directory = non_empty_path(thumbnails_dir);
    cfg.thumbnails.generate = generate;
    cfg.cache.directory = non_empty_path(cache_dir);

    config::save_config(&cfg).context("설정을 저장하지 못했습니다")?;
    println!("\n설정이 저장되었습니다!");
    print_summary(&cfg);
    Ok(())
}

fn path_text(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

fn non_empty_path(text: String) -> Option<PathBuf> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(PathBuf::from(text))
    }
}

fn print_summary(cfg: &Config) {
    let mut table = Table::new();
    table.set_header(vec!["소스", "썸네일 디렉토리"]);
    for kind in [SourceKind::Songwhip, SourceKind::Spotify, SourceKind::Codepen] {
        table.add_row(vec![
            Cell::new(format!("{kind:?}")),
            Cell::new(cfg.thumbnails_directory(kind).display()),
        ]);
    }
    println!("{table}");
    println!("캐시 디렉토리: {}", cfg.cache_directory().display());
}
