use crate::{ZoneCommand, ZoneUpdate};
use tokio::sync::mpsc;
use zone_engine::session::{DesiredSet, SessionScope};
use zone_engine::{EditorOptions, PageId, TemplateId, ZonePersistence, ingest_document};

/// Async worker task that processes zone commands and sends updates.
///
/// Stops when the command channel closes or `scope` is torn down. Work in
/// flight at teardown is dropped and produces no update.
pub async fn worker_task(
    service: ZonePersistence,
    scope: SessionScope,
    mut command_rx: mpsc::UnboundedReceiver<ZoneCommand>,
    update_tx: mpsc::UnboundedSender<ZoneUpdate>,
) {
    let mut options = EditorOptions::default();
    let token = scope.token();

    loop {
        let cmd = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            cmd = command_rx.recv() => match cmd {
                Some(cmd) => cmd,
                None => break,
            },
        };
        process_command(
            cmd,
            &service,
            &scope,
            &mut options,
            &mut command_rx,
            &update_tx,
        )
        .await;
    }
    log::debug!("Zone worker stopped");
}

struct PendingSave {
    template_id: TemplateId,
    page_id: PageId,
    canvas: (f64, f64),
    desired: DesiredSet,
    is_new_template: bool,
}

async fn process_command(
    cmd: ZoneCommand,
    service: &ZonePersistence,
    scope: &SessionScope,
    options: &mut EditorOptions,
    command_rx: &mut mpsc::UnboundedReceiver<ZoneCommand>,
    update_tx: &mpsc::UnboundedSender<ZoneUpdate>,
) {
    match cmd {
        ZoneCommand::LoadPage {
            page_id,
            canvas_width,
            canvas_height,
        } => {
            handle_load_page(
                page_id,
                (canvas_width, canvas_height),
                options.mismatch_tolerance,
                service,
                scope,
                update_tx,
            )
            .await;
        }
        ZoneCommand::SaveTemplate {
            template_id,
            page_id,
            canvas_width,
            canvas_height,
            desired,
            is_new_template,
        } => {
            let mut save = PendingSave {
                template_id,
                page_id,
                canvas: (canvas_width, canvas_height),
                desired,
                is_new_template,
            };

            // Drain queued saves, keeping only the most recent per template.
            // Draining stops at the first other command, which runs once the
            // save is done so writes keep their queue order.
            let mut deferred = None;
            while let Ok(next_cmd) = command_rx.try_recv() {
                match next_cmd {
                    ZoneCommand::SaveTemplate {
                        template_id,
                        page_id,
                        canvas_width,
                        canvas_height,
                        desired,
                        is_new_template,
                    } => {
                        let next = PendingSave {
                            template_id,
                            page_id,
                            canvas: (canvas_width, canvas_height),
                            desired,
                            is_new_template,
                        };
                        if next.template_id == save.template_id && next.page_id == save.page_id {
                            log::debug!("Discarding queued save, using newer zone set");
                            // A newer save of a template still being created is still a create
                            let is_new = save.is_new_template || next.is_new_template;
                            save = PendingSave {
                                is_new_template: is_new,
                                ..next
                            };
                        } else {
                            let previous = std::mem::replace(&mut save, next);
                            handle_save(previous, service, scope, update_tx).await;
                        }
                    }
                    other => {
                        deferred = Some(other);
                        break;
                    }
                }
            }

            handle_save(save, service, scope, update_tx).await;

            if let Some(next_cmd) = deferred {
                Box::pin(process_command(
                    next_cmd, service, scope, options, command_rx, update_tx,
                ))
                .await;
            }
        }
        ZoneCommand::DeleteZone {
            zone_id,
            assignment_id,
        } => {
            if let Some(outcome) = scope
                .run(service.delete_zone(zone_id, assignment_id))
                .await
            {
                let _ = update_tx.send(ZoneUpdate::ZoneDeleted {
                    zone_id,
                    succeeded: outcome.succeeded(),
                });
            }
        }
        ZoneCommand::IngestDocument { template_id, path } => {
            match scope
                .run(ingest_document(
                    service,
                    template_id,
                    &path,
                    options.mismatch_tolerance,
                ))
                .await
            {
                Some(Ok(outcome)) => {
                    let _ = update_tx.send(ZoneUpdate::DocumentIngested {
                        template_id,
                        outcome,
                    });
                }
                Some(Err(e)) => {
                    let _ = update_tx.send(ZoneUpdate::Error {
                        message: format!("Failed to ingest {}: {}", path.display(), e),
                    });
                }
                None => {}
            }
        }
        ZoneCommand::LoadOptions { path } => match EditorOptions::load(&path).await {
            Ok(loaded) => {
                *options = loaded.clone();
                let _ = update_tx.send(ZoneUpdate::OptionsLoaded { options: loaded });
            }
            Err(e) => {
                let _ = update_tx.send(ZoneUpdate::Error {
                    message: format!("Failed to load options: {}", e),
                });
            }
        },
    }
}

async fn handle_load_page(
    page_id: PageId,
    canvas: (f64, f64),
    tolerance: f64,
    service: &ZonePersistence,
    scope: &SessionScope,
    update_tx: &mpsc::UnboundedSender<ZoneUpdate>,
) {
    let load = async {
        let context = service.page_context(page_id, canvas.0, canvas.1).await?;
        let zones = service.load_canvas_zones(&context).await?;
        Ok::<_, zone_engine::ZoneError>((zones, context.system.mismatch_warning(tolerance)))
    };

    match scope.run(load).await {
        Some(Ok((zones, mismatch))) => {
            let _ = update_tx.send(ZoneUpdate::PageLoaded {
                page_id,
                zones,
                mismatch,
            });
        }
        Some(Err(e)) => {
            let _ = update_tx.send(ZoneUpdate::Error {
                message: format!("Failed to load page: {}", e),
            });
        }
        None => log::debug!("Discarding page load after teardown"),
    }
}

async fn handle_save(
    save: PendingSave,
    service: &ZonePersistence,
    scope: &SessionScope,
    update_tx: &mpsc::UnboundedSender<ZoneUpdate>,
) {
    let run = async {
        let context = service
            .page_context(save.page_id, save.canvas.0, save.canvas.1)
            .await?;
        service
            .reconcile_zone_set(
                &save.desired.zones,
                save.template_id,
                save.is_new_template,
                &context,
            )
            .await
    };

    match scope.run(run).await {
        Some(Ok(report)) => {
            let _ = update_tx.send(ZoneUpdate::Saved {
                desired: save.desired,
                report,
            });
        }
        Some(Err(e)) => {
            let _ = update_tx.send(ZoneUpdate::Error {
                message: format!("Failed to save template: {}", e),
            });
        }
        None => log::debug!("Discarding save result after teardown"),
    }
}
