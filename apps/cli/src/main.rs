use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use voyagelog_core::{DraftStore, EditorSession, LogEntry, LogMode, LogPreview, MessageFormat, Team};
use voyagelog_printing::{ArtifactKind, CaptureExporter, DirectorySink, ExportReport};
use voyagelog_settings::{JsonFileStore, PreferencesStore};

const WORKSPACE_DIR: &str = ".voyagelog";

#[derive(Parser)]
#[command(
    name = "voyagelog",
    about = "Write, paginate and export voyage logs",
    author,
    version
)]
struct Cli {
    /// 指定工作區根目錄；預設為目前目錄。 / Workspace root (defaults to current directory).
    #[arg(long, global = true, value_name = "PATH")]
    workspace: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 顯示日誌內文的分頁結果。 / Show how the log body splits into pages.
    Paginate(PaginateArgs),
    /// 將每一頁匯出為 PDF 或 PNG。 / Export every page as PDF and/or PNG.
    Export(ExportArgs),
    /// 產生可貼上聊天室的訊息。 / Render the log as a chat message.
    Message(MessageArgs),
    /// 管理草稿內容。 / Inspect or edit the saved draft.
    #[command(subcommand)]
    Draft(DraftCommand),
    /// 匯入/匯出偏好設定。 / Import or export preferences.
    #[command(subcommand)]
    Preferences(PreferencesCommand),
}

#[derive(Args)]
struct PaginateArgs {
    /// 以文字檔取代草稿內文。 / Paginate this text file instead of the draft body.
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// 以 JSON 陣列輸出每頁文字。 / Print the page texts as a JSON array.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ExportArgs {
    /// 輸出格式。 / Output kind.
    #[arg(long, value_enum, default_value_t = KindChoice::Pdf)]
    kind: KindChoice,

    /// 輸出資料夾。 / Destination directory.
    #[arg(long, value_name = "DIR")]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum KindChoice {
    Pdf,
    Png,
    All,
}

impl KindChoice {
    fn kinds(self) -> &'static [ArtifactKind] {
        match self {
            KindChoice::Pdf => &[ArtifactKind::Pdf],
            KindChoice::Png => &[ArtifactKind::Png],
            KindChoice::All => &[ArtifactKind::Pdf, ArtifactKind::Png],
        }
    }
}

#[derive(Args)]
struct MessageArgs {
    /// 訊息格式；預設使用偏好設定。 / Message format tag; defaults to the preference.
    #[arg(long, value_name = "TAG")]
    format: Option<String>,

    /// 列出可用格式。 / List the available format tags.
    #[arg(long, conflicts_with = "format")]
    list: bool,
}

#[derive(Subcommand)]
enum DraftCommand {
    /// 以 JSON 顯示草稿。 / Print the draft as JSON.
    Show,
    /// 設定草稿欄位。 / Set one draft field.
    Set(DraftSetArgs),
    /// 載入範例內容。 / Fill the draft with sample content.
    LoadSample(LoadSampleArgs),
    /// 清除草稿內容（保留模式與船隻）。 / Clear the draft, keeping mode and ship.
    Reset,
}

#[derive(Args)]
struct DraftSetArgs {
    #[arg(value_enum)]
    field: DraftField,

    /// 欄位內容。 / New value.
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    value: Option<String>,

    /// 從檔案讀取欄位內容。 / Read the value from a file.
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DraftField {
    Mode,
    Title,
    Body,
    Signature,
    Subtitle,
    Events,
    Crew,
    Gold,
    Doubloons,
    Team,
    Ship,
}

#[derive(Args)]
struct LoadSampleArgs {
    /// 範例的日誌模式；預設沿用草稿。 / Mode of the sample; defaults to the draft's mode.
    #[arg(long, value_enum)]
    mode: Option<ModeChoice>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeChoice {
    Patrol,
    Skirmish,
}

impl From<ModeChoice> for LogMode {
    fn from(choice: ModeChoice) -> Self {
        match choice {
            ModeChoice::Patrol => LogMode::Patrol,
            ModeChoice::Skirmish => LogMode::Skirmish,
        }
    }
}

#[derive(Subcommand)]
enum PreferencesCommand {
    /// 匯出目前偏好設定。 / Export current preferences.
    Export(PreferencesExportArgs),
    /// 匯入偏好設定 JSON。 / Import preferences from JSON.
    Import(PreferencesImportArgs),
}

#[derive(Args)]
struct PreferencesExportArgs {
    /// 輸出檔案路徑。 / Destination file path.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,
}

#[derive(Args)]
struct PreferencesImportArgs {
    /// 輸入檔案路徑。 / Source preferences JSON.
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<()> {
    let Cli { workspace, command } = Cli::parse();
    let workspace_root = resolve_workspace(workspace)?;
    debug!(workspace = %workspace_root.display(), "resolved workspace");
    match command {
        Commands::Paginate(args) => execute_paginate(args, &workspace_root),
        Commands::Export(args) => execute_export(args, &workspace_root),
        Commands::Message(args) => execute_message(args, &workspace_root),
        Commands::Draft(subcommand) => execute_draft_command(subcommand, &workspace_root),
        Commands::Preferences(subcommand) => {
            execute_preferences_command(subcommand, &workspace_root)
        }
    }
}

fn execute_paginate(args: PaginateArgs, workspace_root: &Path) -> Result<()> {
    let mut entry = load_draft(workspace_root)?;
    if let Some(input) = args.input {
        let input = resolve_input_path(&input)?;
        entry.body = fs::read_to_string(&input)
            .with_context(|| format!("failed to read {}", input.display()))?;
    }
    let session = EditorSession::new(entry);
    let pages = session.pages();

    if args.json {
        let texts = pages.texts();
        println!(
            "{}",
            serde_json::to_string_pretty(&texts).context("failed to encode pages")?
        );
        return Ok(());
    }

    println!("{} page(s)", pages.len());
    for page in pages {
        let lines = if page.text().is_empty() {
            0
        } else {
            page.text().split('\n').count()
        };
        let chars = page.text().chars().count();
        let marker = if page.continues_line() {
            " (continues)"
        } else {
            ""
        };
        println!("Page {}: {lines} line(s), {chars} char(s){marker}", page.number());
    }
    Ok(())
}

fn execute_export(args: ExportArgs, workspace_root: &Path) -> Result<()> {
    let entry = load_draft(workspace_root)?;
    let preferences = load_preferences(workspace_root)?;
    let out = resolve_input_path(&args.out)?;
    let session = EditorSession::new(entry);
    let mut preview = LogPreview::from_session(&session, preferences.preferences());
    let exporter = CaptureExporter::new(DirectorySink::new(&out), session.entry().title.clone());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("create tokio runtime")?;
    let reports = runtime.block_on(async {
        let mut reports = Vec::new();
        for kind in args.kind.kinds() {
            let report = match kind {
                ArtifactKind::Pdf => exporter.export_paged(session.pages(), &mut preview).await,
                ArtifactKind::Png => exporter.export_images(session.pages(), &mut preview).await,
            };
            reports.push(report);
        }
        reports
    });

    let mut failures = 0;
    for report in &reports {
        print_report(report);
        failures += report.failed.len();
    }
    if failures > 0 {
        bail!("{failures} page(s) could not be exported");
    }
    Ok(())
}

fn print_report(report: &ExportReport) {
    for saved in &report.saved {
        match &saved.location {
            Some(path) => println!("Saved {}", path.display()),
            None => println!("Saved {}", saved.file_name),
        }
    }
    for index in &report.skipped {
        println!("Skipped page {} (not rendered)", index + 1);
    }
    for failure in &report.failed {
        match failure.page_index {
            Some(index) => eprintln!("Page {} failed: {}", index + 1, failure.error),
            None => eprintln!("Export task failed: {}", failure.error),
        }
    }
    println!(
        "Exported {} of {} page(s) as {}",
        report.saved.len(),
        report.page_count,
        report.kind
    );
}

fn execute_message(args: MessageArgs, workspace_root: &Path) -> Result<()> {
    if args.list {
        for tag in MessageFormat::supported_tags() {
            println!("{tag}\t{}", MessageFormat::from_tag(tag).display_name());
        }
        return Ok(());
    }
    let entry = load_draft(workspace_root)?;
    let preferences = load_preferences(workspace_root)?;
    let prefs = preferences.preferences();
    let tag = args.format.as_deref().unwrap_or(&prefs.message_format);
    let format = MessageFormat::from_tag(tag);
    if format.tag() != tag.trim() {
        eprintln!("Unknown format '{tag}', using {}", format.tag());
    }
    println!("{}", format.format_message(&entry, &prefs.content));
    Ok(())
}

fn execute_draft_command(command: DraftCommand, workspace_root: &Path) -> Result<()> {
    let mut drafts = open_drafts(workspace_root)?;
    let entry = drafts.load().context("failed to read draft")?;
    let mut session = EditorSession::new(entry);

    match command {
        DraftCommand::Show => {
            println!(
                "{}",
                serde_json::to_string_pretty(session.entry()).context("failed to encode draft")?
            );
            return Ok(());
        }
        DraftCommand::Set(args) => {
            let value = match (args.value, args.file) {
                (_, Some(file)) => {
                    let file = resolve_input_path(&file)?;
                    fs::read_to_string(&file)
                        .with_context(|| format!("failed to read {}", file.display()))?
                }
                (Some(value), None) => value,
                (None, None) => bail!("a value or --file is required"),
            };
            apply_field(&mut session, args.field, value)?;
            println!("Updated {:?}", args.field);
        }
        DraftCommand::LoadSample(args) => {
            if let Some(mode) = args.mode {
                session.edit(|entry| entry.mode = mode.into());
            }
            session.load_testing_data();
            println!("Loaded sample {} log", session.entry().mode);
        }
        DraftCommand::Reset => {
            session.reset();
            println!("Draft cleared");
        }
    }

    drafts
        .save(session.entry())
        .with_context(|| format!("failed to save draft to {}", draft_path(workspace_root).display()))
}

fn apply_field(session: &mut EditorSession, field: DraftField, value: String) -> Result<()> {
    match field {
        DraftField::Mode => {
            let mode: LogMode = value.parse().context("mode must be 'patrol' or 'skirmish'")?;
            session.edit(|entry| entry.mode = mode);
        }
        DraftField::Team => {
            let team: Team = value.parse().context("team must be 'Athena' or 'Reaper'")?;
            session.edit(|entry| entry.our_team = team);
        }
        DraftField::Title => session.set_title(value),
        DraftField::Body => session.set_body(value),
        DraftField::Signature => session.set_signature(value),
        DraftField::Subtitle => session.edit(|entry| entry.subtitle = value),
        DraftField::Events => session.edit(|entry| entry.events = value),
        DraftField::Crew => session.edit(|entry| entry.crew = value),
        DraftField::Gold => session.edit(|entry| entry.gold = value),
        DraftField::Doubloons => session.edit(|entry| entry.doubloons = value),
        DraftField::Ship => session.edit(|entry| entry.ship = value),
    }
    Ok(())
}

fn execute_preferences_command(command: PreferencesCommand, workspace_root: &Path) -> Result<()> {
    match command {
        PreferencesCommand::Export(args) => export_preferences(args, workspace_root),
        PreferencesCommand::Import(args) => import_preferences(args, workspace_root),
    }
}

fn export_preferences(args: PreferencesExportArgs, workspace_root: &Path) -> Result<()> {
    let store = load_preferences(workspace_root)?;
    let output = resolve_input_path(&args.output)?;
    store
        .export_to(&output)
        .with_context(|| format!("failed to export preferences to {}", output.display()))?;
    println!("Exported preferences to {}", output.display());
    Ok(())
}

fn import_preferences(args: PreferencesImportArgs, workspace_root: &Path) -> Result<()> {
    let mut store = load_preferences(workspace_root)?;
    let input = resolve_input_path(&args.input)?;
    if !input.exists() {
        bail!("preferences file '{}' does not exist", input.display());
    }
    store
        .import_from(&input)
        .with_context(|| format!("failed to import preferences from {}", input.display()))?;
    println!("Imported preferences from {}", input.display());
    Ok(())
}

fn load_preferences(workspace_root: &Path) -> Result<PreferencesStore> {
    let prefs_path = preferences_path(workspace_root);
    PreferencesStore::load(&prefs_path)
        .with_context(|| format!("failed to load preferences from {}", prefs_path.display()))
}

fn open_drafts(workspace_root: &Path) -> Result<DraftStore<JsonFileStore>> {
    let path = draft_path(workspace_root);
    let store = JsonFileStore::open(&path)
        .with_context(|| format!("failed to open draft {}", path.display()))?;
    Ok(DraftStore::new(store))
}

fn load_draft(workspace_root: &Path) -> Result<LogEntry> {
    open_drafts(workspace_root)?
        .load()
        .context("failed to read draft")
}

fn preferences_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(WORKSPACE_DIR).join("preferences.json")
}

fn draft_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(WORKSPACE_DIR).join("draft.json")
}

fn resolve_workspace(workspace: Option<PathBuf>) -> Result<PathBuf> {
    match workspace {
        Some(path) => resolve_input_path(&path),
        None => std::env::current_dir().context("determine current directory"),
    }
}

fn resolve_input_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("determine current directory")?
            .join(path))
    }
}
