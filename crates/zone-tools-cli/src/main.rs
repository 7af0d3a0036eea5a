use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use zone_engine::session::{EditEvent, EditIntent, ZoneEditor};
use zone_engine::{
    BleedSettings, EditorOptions, MemoryStore, NewTemplate, PhysicalSize, TemplateId,
    TemplatePage, Unit, UnitConverter, ZoneId, ZonePersistence, ZoneType, compute_guides,
    ingest_document,
};

mod logger;

use logger::CliLogger;

#[derive(Parser)]
#[command(name = "zonet")]
#[command(about = "Customization zone tools for print templates", version)]
struct Cli {
    /// JSON snapshot holding templates, pages and zones
    #[arg(long, global = true, default_value = "zones.json")]
    db: PathBuf,

    /// Editor options file (JSON)
    #[arg(long, global = true)]
    options: Option<PathBuf>,

    /// More log output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage templates
    Template {
        #[command(subcommand)]
        command: TemplateCommand,
    },

    /// Import a PDF as a template's pages, replacing any existing pages
    Ingest {
        template: TemplateId,
        input: PathBuf,
    },

    /// Manage customization zones
    Zone {
        #[command(subcommand)]
        command: ZoneCommand,
    },

    /// Convert a length between px, mm, in and pt
    Convert {
        value: f64,
        from: String,
        to: String,

        /// Reference DPI for pixel conversions
        #[arg(long)]
        dpi: Option<f64>,
    },

    /// Compare each page with the template's declared size and print guides
    Check { template: TemplateId },
}

#[derive(Subcommand)]
enum TemplateCommand {
    Create {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "general")]
        category: String,

        /// Declared size, e.g. "210x297mm" or "8.5x11in"
        #[arg(long)]
        size: String,

        /// Uniform bleed in millimeters
        #[arg(long, default_value = "0")]
        bleed_mm: f64,
    },
    Show { template: TemplateId },
}

#[derive(Subcommand)]
enum ZoneCommand {
    /// Add a zone on one page. Without a position it goes to the next grid cell.
    Add(AddZoneArgs),
    List {
        template: TemplateId,

        /// Only this page (1-based)
        #[arg(long)]
        page: Option<u32>,
    },
    Delete { zone: ZoneId },
}

#[derive(Args)]
struct AddZoneArgs {
    template: TemplateId,

    #[arg(long, default_value = "1")]
    page: u32,

    #[arg(long = "type", value_enum)]
    zone_type: ZoneTypeArg,

    #[arg(long)]
    name: Option<String>,

    /// Canvas position and size in pixels
    #[arg(long, requires = "y")]
    x: Option<f64>,
    #[arg(long, requires = "x")]
    y: Option<f64>,
    #[arg(long, requires = "height")]
    width: Option<f64>,
    #[arg(long, requires = "width")]
    height: Option<f64>,

    /// Show the zone on every page of the template
    #[arg(long)]
    repeating: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ZoneTypeArg {
    Image,
    Text,
}

impl From<ZoneTypeArg> for ZoneType {
    fn from(arg: ZoneTypeArg) -> Self {
        match arg {
            ZoneTypeArg::Image => ZoneType::Image,
            ZoneTypeArg::Text => ZoneType::Text,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    CliLogger::new(CliLogger::level_for(cli.verbose, cli.quiet))
        .init()
        .context("Failed to install logger")?;

    let options = match &cli.options {
        Some(path) => EditorOptions::load(path)
            .await
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => EditorOptions::default(),
    };

    let store = Arc::new(
        MemoryStore::load(&cli.db)
            .await
            .with_context(|| format!("Failed to open {}", cli.db.display()))?,
    );
    let service = ZonePersistence::new(store.clone()).with_converter(options.converter()?);

    let modified = match cli.command {
        Commands::Template { command } => run_template(command, &service).await?,
        Commands::Ingest { template, input } => {
            let outcome =
                ingest_document(&service, template, &input, options.mismatch_tolerance).await?;
            for warning in &outcome.warnings {
                println!("Warning: {}", warning);
            }
            println!("{}", outcome.message);
            if !outcome.success {
                store.save(&cli.db).await?;
                bail!("Ingest of {} did not complete", input.display());
            }
            true
        }
        Commands::Zone { command } => run_zone(command, &service, &options).await?,
        Commands::Convert {
            value,
            from,
            to,
            dpi,
        } => {
            let converter = match dpi {
                Some(dpi) => UnitConverter::with_dpi(dpi)?,
                None => options.converter()?,
            };
            let from: Unit = from.parse()?;
            let to: Unit = to.parse()?;
            println!("{} {}", converter.convert(value, from, to), to);
            false
        }
        Commands::Check { template } => {
            check_template(template, &service, &options).await?;
            false
        }
    };

    if modified {
        store
            .save(&cli.db)
            .await
            .with_context(|| format!("Failed to write {}", cli.db.display()))?;
        log::info!("Saved {}", cli.db.display());
    }

    Ok(())
}

async fn run_template(command: TemplateCommand, service: &ZonePersistence) -> Result<bool> {
    match command {
        TemplateCommand::Create {
            name,
            category,
            size,
            bleed_mm,
        } => {
            let dimensions: PhysicalSize = size.parse()?;
            let bleed = BleedSettings::uniform(bleed_mm, Unit::Millimeter);
            bleed.validate()?;

            let template = service
                .create_template(NewTemplate::new(name, category, dimensions).with_bleed(bleed))
                .await?;
            println!("Created template {} ({})", template.id, template.name);
            Ok(true)
        }
        TemplateCommand::Show { template } => {
            let template = service.get_template(template).await?;
            println!("{} ({})", template.name, template.id);
            println!("  Category:   {}", template.category);
            println!("  Size:       {}", template.dimensions);
            if !template.bleed_settings.is_zero() {
                let b = &template.bleed_settings;
                println!(
                    "  Bleed:      {} {} {} {} {}",
                    b.top, b.right, b.bottom, b.left, b.unit
                );
            }
            if let Some(url) = &template.original_document_url {
                println!("  Document:   {}", url);
            }
            for (key, value) in &template.document_metadata {
                println!("  {:<11} {}", format!("{key}:"), value);
            }

            let pages = service.list_pages(template.id).await?;
            println!("  Pages:      {}", pages.len());
            for page in &pages {
                let size = page
                    .native_size()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown size".to_string());
                println!("    {:>3}. {} ({})", page.page_number, size, page.id);
            }
            println!("  Zones:      {}", service.list_zones(template.id).await?.len());
            Ok(false)
        }
    }
}

async fn run_zone(
    command: ZoneCommand,
    service: &ZonePersistence,
    options: &EditorOptions,
) -> Result<bool> {
    match command {
        ZoneCommand::Add(args) => {
            let page = find_page(service, args.template, args.page).await?;
            let context = service
                .page_context(page.id, options.canvas_width, options.canvas_height)
                .await?;

            // Existing zones decide the grid cell and stacking order
            let mut editor = ZoneEditor::from_options(options);
            editor.load(service.load_canvas_zones(&context).await?);

            let EditEvent::Created(handle) = editor.apply(EditIntent::Create {
                zone_type: args.zone_type.into(),
                name: args.name,
            })?
            else {
                bail!("Zone was not created");
            };
            if let (Some(x), Some(y)) = (args.x, args.y) {
                editor.apply(EditIntent::Move { handle, x, y })?;
            }
            if let (Some(width), Some(height)) = (args.width, args.height) {
                editor.apply(EditIntent::Resize {
                    handle,
                    width,
                    height,
                })?;
            }
            if args.repeating {
                editor.apply(EditIntent::SetRepeating {
                    handle,
                    repeating: true,
                })?;
            }

            let Some(zone) = editor.get(handle) else {
                bail!("Zone {} disappeared from the editor", handle);
            };
            let created = service.create_zone(args.template, zone, &context).await?;
            println!(
                "Created {} zone \"{}\" ({}) on page {}",
                zone.zone_type(),
                zone.name(),
                created.zone_id,
                page.page_number
            );
            if let Some(warning) = context.system.mismatch_warning(options.mismatch_tolerance) {
                println!("Warning: {}", warning);
            }
            Ok(true)
        }
        ZoneCommand::List { template, page } => {
            let pages = service.list_pages(template).await?;
            if pages.is_empty() {
                println!("Template has no pages");
            }
            for p in pages.iter().filter(|p| page.is_none_or(|n| n == p.page_number)) {
                println!("Page {}:", p.page_number);
                let zones = service.load_zones_for_page(p.id).await?;
                if zones.is_empty() {
                    println!("  (no zones)");
                }
                for z in zones {
                    let g = z.geometry;
                    println!(
                        "  [{}] {:<5} {:<20} x={:.3} y={:.3} w={:.3} h={:.3}{}{}  {}",
                        z.assignment.z_index,
                        z.zone.zone_type,
                        z.zone.name,
                        g.x,
                        g.y,
                        g.width,
                        g.height,
                        if z.assignment.is_repeating { " repeating" } else { "" },
                        if z.inherited { " (inherited)" } else { "" },
                        z.zone.id
                    );
                }
            }
            Ok(false)
        }
        ZoneCommand::Delete { zone } => {
            delete_zone_everywhere(service, zone).await?;
            println!("Deleted zone {}", zone);
            Ok(true)
        }
    }
}

async fn check_template(
    template_id: TemplateId,
    service: &ZonePersistence,
    options: &EditorOptions,
) -> Result<()> {
    let template = service.get_template(template_id).await?;
    let pages = service.list_pages(template_id).await?;
    if pages.is_empty() {
        bail!("Template {} has no pages; ingest a document first", template.name);
    }

    println!("Template {} declares {}", template.name, template.dimensions);
    let mut mismatches = 0;
    for page in &pages {
        let context = service
            .page_context(page.id, options.canvas_width, options.canvas_height)
            .await?;
        match context.system.mismatch_warning(options.mismatch_tolerance) {
            Some(warning) => {
                mismatches += 1;
                println!("Page {}: {}", page.page_number, warning);
            }
            None => println!("Page {}: {} OK", page.page_number, context.system.document()),
        }

        let guides = compute_guides(
            &context.system,
            &template.bleed_settings,
            options.safe_margin_mm,
        );
        println!(
            "  guides (px): bleed {:.1},{:.1} {:.1}x{:.1}  safe {:.1},{:.1} {:.1}x{:.1}",
            guides.bleed.x,
            guides.bleed.y,
            guides.bleed.width,
            guides.bleed.height,
            guides.safe.x,
            guides.safe.y,
            guides.safe.width,
            guides.safe.height
        );
    }

    if mismatches > 0 {
        println!("{} of {} pages differ from the template size", mismatches, pages.len());
    }
    Ok(())
}

/// Delete a zone together with every page placement it has
async fn delete_zone_everywhere(service: &ZonePersistence, zone: ZoneId) -> Result<()> {
    let mut placements: Vec<_> = service
        .store()
        .list_zone_assignments(zone)
        .await?
        .into_iter()
        .map(|a| a.id)
        .collect();
    let last = placements.pop();
    for id in placements {
        service
            .store()
            .delete_assignment(id)
            .await
            .with_context(|| format!("Failed to remove placement {} of zone {}", id, zone))?;
    }
    if !service.delete_zone(zone, last).await.succeeded() {
        bail!("Zone {} was not fully deleted", zone);
    }
    Ok(())
}

async fn find_page(
    service: &ZonePersistence,
    template_id: TemplateId,
    page_number: u32,
) -> Result<TemplatePage> {
    service
        .list_pages(template_id)
        .await?
        .into_iter()
        .find(|p| p.page_number == page_number)
        .with_context(|| format!("Template {} has no page {}", template_id, page_number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use zone_engine::store::StoreOp;
    use zone_engine::{NewAssignment, NewPage, PageContext, Rect, ZoneGeometry};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_zone_add_requires_both_coordinates() {
        let template = TemplateId::new().to_string();
        let parsed = Cli::try_parse_from([
            "zonet", "zone", "add", &template, "--type", "text", "--x", "10",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "zonet", "--db", "menu.json", "zone", "add", &template, "--type", "image", "--x",
            "10", "--y", "20", "--repeating",
        ])
        .unwrap();
        assert_eq!(parsed.db, PathBuf::from("menu.json"));
        match parsed.command {
            Commands::Zone {
                command: ZoneCommand::Add(args),
            } => {
                assert_eq!(args.page, 1);
                assert_eq!((args.x, args.y), (Some(10.0), Some(20.0)));
                assert!(args.repeating);
            }
            _ => panic!("expected zone add"),
        }
    }

    #[tokio::test]
    async fn test_zone_delete_removes_every_placement() {
        let store = Arc::new(MemoryStore::new());
        let service = ZonePersistence::new(store.clone());
        let template = service
            .create_template(NewTemplate::new(
                "Calendar",
                "calendar",
                "8.5x11in".parse().unwrap(),
            ))
            .await
            .unwrap();
        let mut pages = Vec::new();
        for page_number in 1..=2 {
            pages.push(
                service
                    .create_page(NewPage {
                        template_id: template.id,
                        page_number,
                        preview_image_url: None,
                        native_size: None,
                    })
                    .await
                    .unwrap(),
            );
        }
        let context = PageContext::new(pages[0].clone(), 612.0, 792.0).unwrap();
        let rect = Rect::new(10.0, 10.0, 100.0, 50.0);
        let created = service
            .create_zone(
                template.id,
                &ZoneGeometry::new(ZoneType::Text, "Month", rect).unwrap(),
                &context,
            )
            .await
            .unwrap();
        service
            .store()
            .insert_assignment(NewAssignment {
                zone_id: created.zone_id,
                page_id: pages[1].id,
                rect,
                z_index: 0,
                is_repeating: false,
            })
            .await
            .unwrap();
        store.clear_journal().await;

        delete_zone_everywhere(&service, created.zone_id).await.unwrap();

        let ops: Vec<StoreOp> = store.writes().await.iter().map(|c| c.op).collect();
        assert_eq!(
            ops,
            vec![
                StoreOp::DeleteAssignment,
                StoreOp::DeleteAssignment,
                StoreOp::DeleteZone
            ]
        );
        assert_eq!(store.zone_count().await, 0);
        assert_eq!(store.assignment_count().await, 0);
    }
}
