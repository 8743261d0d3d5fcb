use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use cascade_framing::{
    BlenderBackend, CameraConfig, CritiqueMode, Document, FailurePolicy, FixedSelector,
    ManualSelector, OllamaClient, PatchReport, PoseCatalog, PoseSelector, RenderArtifact,
    SceneOptions, ScoreSelector, SweepOptions, VisionModel, WorkflowConfig, WorkflowOptions,
    build_cascade_scene,
    render::{blender::ensure_parent_dir, bpy::scene_script},
    select::{SelectionStrategy, write_critiques},
    vision::{critique::critique_artifact, prompts},
    workflow::stage_production_scene,
};

#[derive(Parser, Debug)]
#[command(name = "cascade", version)]
struct Cli {
    /// Config file (defaults to `cascade.json` in the working directory, if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the poses in a catalog.
    Poses(CatalogArg),
    /// Render the scene once per pose.
    Sweep(SweepArgs),
    /// Check that the vision endpoint answers and list its models.
    Health,
    /// List PNG renders, newest first.
    Renders(RendersArgs),
    /// Ask the vision model about one render.
    Critique(CritiqueArgs),
    /// Ask the vision model to compare two renders.
    Compare(CompareArgs),
    /// Patch a pose into a legacy production script.
    Apply(ApplyArgs),
    /// Write a pose to the camera config file.
    Persist(PersistArgs),
    /// Production render using the camera config.
    Render(RenderArgs),
    /// Write the generated Blender script without running Blender.
    ExportScript(ExportArgs),
    /// Build, sweep, critique, select and persist in one go.
    Workflow(WorkflowArgs),
}

#[derive(Parser, Debug)]
struct CatalogArg {
    /// `camera_tests`, `framing_tests` or a JSON catalog file.
    #[arg(long, default_value = "framing_tests")]
    catalog: String,
}

#[derive(Parser, Debug)]
struct SweepArgs {
    #[command(flatten)]
    catalog: CatalogArg,

    /// Output directory (defaults to `paths.sweep_dir`).
    #[arg(long)]
    out: Option<PathBuf>,

    /// File name prefix (defaults to `sweep_prefix`).
    #[arg(long)]
    prefix: Option<String>,

    /// Stop at the first failed render.
    #[arg(long)]
    abort_on_error: bool,
}

#[derive(Parser, Debug)]
struct RendersArgs {
    /// Directory to list (defaults to `paths.renders_dir`).
    #[arg(long)]
    dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CritiqueArgs {
    /// Image to critique: a path or a file name in `paths.renders_dir`.
    #[arg(long, conflicts_with = "latest")]
    image: Option<PathBuf>,

    /// Use the newest render in `paths.renders_dir`.
    #[arg(long)]
    latest: bool,

    /// Prompt to send instead of the built-in render analysis.
    #[arg(long)]
    prompt: Option<String>,

    /// Request a structured JSON score.
    #[arg(long)]
    scored: bool,
}

#[derive(Parser, Debug)]
struct CompareArgs {
    /// First render: a path or a file name in `paths.renders_dir` (defaults to the newest).
    #[arg(long)]
    a: Option<PathBuf>,

    /// Second render: a path or a file name in `paths.renders_dir`.
    #[arg(long, required_unless_present = "reference", conflicts_with = "reference")]
    b: Option<PathBuf>,

    /// Reference image: a path or a file name in `paths.references_dir`.
    #[arg(long)]
    reference: Option<PathBuf>,

    #[arg(long)]
    prompt: Option<String>,
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    #[arg(long)]
    pose: String,

    #[command(flatten)]
    catalog: CatalogArg,

    /// Script to patch (defaults to `paths.production_script`).
    #[arg(long)]
    script: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PersistArgs {
    #[arg(long)]
    pose: String,

    #[command(flatten)]
    catalog: CatalogArg,

    /// Camera config path (defaults to `paths.camera_config`).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Camera config path (defaults to `paths.camera_config`).
    #[arg(long)]
    camera: Option<PathBuf>,

    /// Output PNG (defaults to `<paths.renders_dir>/production_<pose>.png`).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Script path to write.
    #[arg(long)]
    out: PathBuf,

    /// Camera config to include; without it the script has no camera and does not render.
    #[arg(long)]
    camera: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct WorkflowArgs {
    #[command(flatten)]
    catalog: CatalogArg,

    /// `manual`, `score`, or a pose name.
    #[arg(long, default_value = "manual")]
    select: String,

    /// Also patch `paths.production_script` with the selected pose.
    #[arg(long)]
    patch: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let cfg = WorkflowConfig::discover(cli.config.as_deref()).context("load configuration")?;

    match cli.cmd {
        Command::Poses(args) => cmd_poses(args),
        Command::Sweep(args) => cmd_sweep(&cfg, args),
        Command::Health => cmd_health(&cfg),
        Command::Renders(args) => cmd_renders(&cfg, args),
        Command::Critique(args) => cmd_critique(&cfg, args),
        Command::Compare(args) => cmd_compare(&cfg, args),
        Command::Apply(args) => cmd_apply(&cfg, args),
        Command::Persist(args) => cmd_persist(&cfg, args),
        Command::Render(args) => cmd_render(&cfg, args),
        Command::ExportScript(args) => cmd_export(&cfg, args),
        Command::Workflow(args) => cmd_workflow(&cfg, args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_catalog(arg: &CatalogArg) -> anyhow::Result<PoseCatalog> {
    PoseCatalog::resolve(&arg.catalog).with_context(|| format!("load catalog '{}'", arg.catalog))
}

fn cmd_poses(args: CatalogArg) -> anyhow::Result<()> {
    let catalog = load_catalog(&args)?;
    for pose in catalog.poses() {
        println!("{pose}");
    }
    Ok(())
}

fn cmd_sweep(cfg: &WorkflowConfig, args: SweepArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(&args.catalog)?;
    let mut backend = BlenderBackend::new(&cfg.blender, cfg.preview.clone())?;
    let mut doc = Document::new();
    build_cascade_scene(&mut doc, &SceneOptions::default())?;

    let opts = SweepOptions {
        output_dir: args.out.unwrap_or_else(|| cfg.paths.sweep_dir.clone()),
        prefix: args.prefix.unwrap_or_else(|| cfg.sweep_prefix.clone()),
        on_failure: if args.abort_on_error {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Continue
        },
    };
    let report = cascade_framing::run_sweep(&mut doc, &mut backend, catalog.poses(), &opts)?;

    for artifact in &report.artifacts {
        println!("{}: {}", artifact.pose_name, artifact.file_path.display());
    }
    for failure in &report.failures {
        println!("{}: FAILED ({})", failure.pose_name, failure.error);
    }
    if !report.is_complete() {
        anyhow::bail!(
            "{} of {} renders failed",
            report.failures.len(),
            catalog.len()
        );
    }
    Ok(())
}

fn cmd_health(cfg: &WorkflowConfig) -> anyhow::Result<()> {
    let client = OllamaClient::new(&cfg.vision)?;
    let models = client
        .list_models()
        .with_context(|| format!("vision endpoint {} is not reachable", client.base_url()))?;
    println!("{} is up ({} models)", client.base_url(), models.len());
    for model in &models {
        let marker = if model.name == client.model() { "*" } else { " " };
        println!("{marker} {}", model.name);
    }
    if !models.iter().any(|m| m.name == client.model()) {
        tracing::warn!(model = client.model(), "configured model is not pulled on the server");
    }
    Ok(())
}

fn cmd_renders(cfg: &WorkflowConfig, args: RendersArgs) -> anyhow::Result<()> {
    let dir = args.dir.unwrap_or_else(|| cfg.paths.renders_dir.clone());
    for entry in cascade_framing::list_renders(&dir)? {
        println!(
            "{}  {}",
            entry.modified.format("%Y-%m-%d %H:%M:%S"),
            entry.file_name()
        );
    }
    Ok(())
}

fn cmd_critique(cfg: &WorkflowConfig, args: CritiqueArgs) -> anyhow::Result<()> {
    let image = match (args.image, args.latest) {
        (Some(name), _) => cfg.paths.resolve_render(&name)?,
        (None, true) => cascade_framing::latest_render(&cfg.paths.renders_dir)?.path,
        (None, false) => anyhow::bail!("pass --image <path> or --latest"),
    };
    let client = OllamaClient::new(&cfg.vision)?;
    let prompt = args.prompt.as_deref().unwrap_or(prompts::RENDER_ANALYSIS);
    eprintln!("critiquing {} with {}", image.display(), client.model());

    if args.scored {
        let artifact = RenderArtifact::from_file(&image, Some(cfg.sweep_prefix.as_str()))?;
        let result = critique_artifact(&client, &artifact, prompt, CritiqueMode::Scored)?;
        println!("{}", result.raw_text);
        match result.score {
            Some(score) => println!("score: {score}"),
            None => println!("score: (not parsed)"),
        }
    } else {
        println!("{}", client.critique(&image, prompt)?);
    }
    Ok(())
}

fn cmd_compare(cfg: &WorkflowConfig, args: CompareArgs) -> anyhow::Result<()> {
    let a = match &args.a {
        Some(name) => cfg.paths.resolve_render(name)?,
        None => cascade_framing::latest_render(&cfg.paths.renders_dir)?.path,
    };
    let (b, default_prompt) = match (&args.b, &args.reference) {
        (Some(name), _) => (cfg.paths.resolve_render(name)?, prompts::COMPARE_RUBRIC),
        (None, Some(name)) => (cfg.paths.resolve_reference(name)?, prompts::REFERENCE_RUBRIC),
        (None, None) => anyhow::bail!("pass --b <render> or --reference <image>"),
    };
    let client = OllamaClient::new(&cfg.vision)?;
    let prompt = args.prompt.as_deref().unwrap_or(default_prompt);
    eprintln!("comparing {} with {}", a.display(), b.display());
    println!("{}", client.compare(&a, &b, prompt)?);
    Ok(())
}

fn print_patch_report(report: &PatchReport) {
    for field in &report.fields {
        println!(
            "{}: {} replacement(s) -> {}",
            field.field, field.replacements, field.value
        );
    }
    if report.written {
        println!("updated {}", report.script.display());
    } else {
        println!("no changes written to {}", report.script.display());
    }
}

fn cmd_apply(cfg: &WorkflowConfig, args: ApplyArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(&args.catalog)?;
    let script = args
        .script
        .unwrap_or_else(|| cfg.paths.production_script.clone());
    let report = cascade_framing::apply_named_pose(&script, &catalog, &args.pose)?;
    print_patch_report(&report);
    if !report.written {
        anyhow::bail!("no camera statements found in '{}'", script.display());
    }
    Ok(())
}

fn cmd_persist(cfg: &WorkflowConfig, args: PersistArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(&args.catalog)?;
    let pose = catalog.get_pose(&args.pose)?.clone();
    let out = args.out.unwrap_or_else(|| cfg.paths.camera_config.clone());
    let config = CameraConfig::new(pose, Some(args.catalog.catalog));
    cascade_framing::save_camera_config(&out, &config)?;
    println!("{} -> {}", config.pose, out.display());
    Ok(())
}

fn cmd_render(cfg: &WorkflowConfig, args: RenderArgs) -> anyhow::Result<()> {
    let camera = args
        .camera
        .unwrap_or_else(|| cfg.paths.camera_config.clone());
    let out = match args.out {
        Some(out) => out,
        None => {
            let config = cascade_framing::load_camera_config(&camera)?;
            cfg.paths
                .renders_dir
                .join(config.pose.render_file_name("production"))
        }
    };
    let mut backend = BlenderBackend::new(&cfg.blender, cfg.production.clone())?;
    let mut doc = Document::new();
    let artifact = cascade_framing::render_production(
        &mut doc,
        &mut backend,
        &SceneOptions::default(),
        &camera,
        &out,
    )?;
    println!("{}: {}", artifact.pose_name, artifact.file_path.display());
    Ok(())
}

fn cmd_export(cfg: &WorkflowConfig, args: ExportArgs) -> anyhow::Result<()> {
    let mut doc = Document::new();
    let scene = SceneOptions::default();
    match &args.camera {
        Some(path) => {
            let config = cascade_framing::load_camera_config(path)?;
            stage_production_scene(&mut doc, &scene, &config)?;
        }
        None => build_cascade_scene(&mut doc, &scene)?,
    }
    let script = scene_script(&doc, &cfg.production, None)?;
    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, script)
        .with_context(|| format!("write '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_workflow(cfg: &WorkflowConfig, args: WorkflowArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(&args.catalog)?;
    let strategy = SelectionStrategy::parse(&args.select, &catalog)
        .with_context(|| format!("invalid --select '{}'", args.select))?;

    let client = OllamaClient::new(&cfg.vision)?;
    let vision: Option<&dyn VisionModel> = match client.list_models() {
        Ok(_) => Some(&client),
        Err(err) if strategy == SelectionStrategy::Score => {
            return Err(err).context("--select score needs the vision endpoint");
        }
        Err(err) => {
            tracing::warn!(error = %err, "vision endpoint unavailable; continuing without critiques");
            None
        }
    };
    let mut backend = BlenderBackend::new(&cfg.blender, cfg.preview.clone())?;

    let mode = strategy.critique_mode();
    let interactive = strategy == SelectionStrategy::Manual;
    let mut selector: Box<dyn PoseSelector> = match strategy {
        SelectionStrategy::Manual => Box::new(ManualSelector::new(
            std::io::stdin().lock(),
            std::io::stdout(),
        )),
        SelectionStrategy::Score => Box::new(ScoreSelector),
        SelectionStrategy::Fixed(pose) => Box::new(FixedSelector::new(pose)),
    };

    let opts = WorkflowOptions {
        scene: SceneOptions::default(),
        sweep: SweepOptions {
            output_dir: cfg.paths.sweep_dir.clone(),
            prefix: cfg.sweep_prefix.clone(),
            on_failure: FailurePolicy::Continue,
        },
        rubric: prompts::CAMERA_RUBRIC.to_string(),
        critique_mode: mode,
        camera_config: cfg.paths.camera_config.clone(),
        patch_script: args.patch.then(|| cfg.paths.production_script.clone()),
        catalog_label: Some(args.catalog.catalog.clone()),
    };

    let mut doc = Document::new();
    let report = cascade_framing::run_workflow(
        &mut doc,
        &mut backend,
        vision,
        selector.as_mut(),
        &catalog,
        &opts,
    )?;

    // The manual selector already showed the critiques before asking.
    if !interactive {
        write_critiques(std::io::stdout().lock(), &report.critiques.results)
            .context("print critiques")?;
    }
    for skipped in &report.critiques.skipped {
        println!("{}: critique skipped ({})", skipped.pose_name, skipped.error);
    }
    println!("selected {}", report.selected);
    println!("camera config: {}", report.camera_config.display());
    if let Some(patch) = &report.patch {
        print_patch_report(patch);
    }
    Ok(())
}
