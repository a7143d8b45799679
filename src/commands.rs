//! The two user-triggered workflows: import and embed.
//!
//! Each workflow starts from a block containing a Markdown link to a
//! PDF asset, resolves the file through the active [`AssetSession`],
//! and runs to completion or aborts with a precise error. Per-record
//! problems inside a pass are logged and skipped upstream (during
//! extraction); everything at this level is load-bearing and aborts.

use std::collections::HashSet;

use crate::assets::{file_name, resolve_pdf_path, sidecar_name, AssetSession};
use crate::config::Settings;
use crate::dedup::dedup_namespace;
use crate::edn;
use crate::embed::{embed_highlights, EmbedRequest};
use crate::error::{Error, Result};
use crate::extract::extract_from_bytes;
use crate::host::{Host, Status};
use crate::notes::{asset_link, highlight_blocks, notes_page_title};

/// Shared state for a command invocation.
pub struct CommandContext<'a> {
    /// Reference to the block the user invoked the command on.
    pub block_ref: String,
    /// Asset directory access for this invocation.
    pub session: &'a mut AssetSession,
    /// Validated user settings.
    pub settings: &'a Settings,
}

/// What a command produced beyond its side effects.
#[derive(Debug, Default)]
pub struct CommandOutcome {
    /// The updated PDF bytes, present when the user asked for an
    /// exported copy of the embedded document.
    pub exported_pdf: Option<Vec<u8>>,
}

/// A host-invokable workflow.
pub trait Command {
    /// Identifier the host registers the command under.
    fn name(&self) -> &'static str;

    /// Run the workflow. On failure the user has already been notified;
    /// the error is returned for the host's own handling.
    fn invoke(&self, host: &mut dyn Host, ctx: &mut CommandContext<'_>) -> Result<CommandOutcome>;
}

/// Pull highlight annotations out of the linked PDF into the notes
/// graph and the EDN sidecar.
#[derive(Debug, Default)]
pub struct ImportAnnotations;

/// Push pending highlight records from the EDN sidecar into the linked
/// PDF as real annotations.
#[derive(Debug, Default)]
pub struct EmbedAnnotations;

impl Command for ImportAnnotations {
    fn name(&self) -> &'static str {
        "import-annotations"
    }

    fn invoke(&self, host: &mut dyn Host, ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
        match import_annotations(host, ctx) {
            Ok(()) => Ok(CommandOutcome::default()),
            Err(err) => {
                host.notify(Status::Error, &format!("Import failed: {}", err));
                Err(err)
            }
        }
    }
}

impl Command for EmbedAnnotations {
    fn name(&self) -> &'static str {
        "embed-annotations"
    }

    fn invoke(&self, host: &mut dyn Host, ctx: &mut CommandContext<'_>) -> Result<CommandOutcome> {
        match embed_annotations(host, ctx) {
            Ok(exported_pdf) => Ok(CommandOutcome { exported_pdf }),
            Err(err) => {
                host.notify(Status::Error, &format!("Embed failed: {}", err));
                Err(err)
            }
        }
    }
}

/// Extract highlights from the PDF linked in the context block, write
/// the EDN sidecar, and materialize one notes block per highlight.
///
/// With `overwrite_existing` set, an existing notes page is deleted
/// first. Otherwise, with `check_duplicate`, only the blocks this
/// workflow generated earlier (those carrying the marker) are replaced
/// and the user's own blocks survive.
///
/// # Errors
///
/// [`Error::MissingAsset`] when the block has no content or no PDF
/// link; otherwise whatever reading, parsing, or storage failed.
pub fn import_annotations(host: &mut dyn Host, ctx: &mut CommandContext<'_>) -> Result<()> {
    ctx.settings.validate()?;
    let pdf_name = linked_pdf_name(host, ctx)?;
    let bytes = ctx.session.read(&pdf_name)?;
    let records = extract_from_bytes(&bytes, ctx.settings.identity_mode)?;
    if records.is_empty() {
        host.notify(
            Status::Success,
            &format!("No highlight annotations found in {}", pdf_name),
        );
        return Ok(());
    }

    ctx.session
        .write(&sidecar_name(&pdf_name, "edn"), edn::to_edn(&records).as_bytes())?;

    let title = notes_page_title(&pdf_name);
    if host.page_exists(&title)? {
        if ctx.settings.overwrite_existing {
            host.delete_page(&title)?;
        } else if ctx.settings.check_duplicate {
            host.remove_marked_blocks(&title, &ctx.settings.marker)?;
        }
    }
    if !host.page_exists(&title)? {
        host.create_page(&title, &asset_link(&pdf_name))?;
    }

    let namespace = dedup_namespace(&pdf_name);
    for (record, block) in records
        .iter()
        .zip(highlight_blocks(&records, &ctx.settings.marker))
    {
        host.append_block(&title, &block)?;
        host.mark_processed(&namespace, record.id)?;
    }

    if !host.has_marker(&ctx.block_ref, &ctx.settings.marker)? {
        host.set_marker(&ctx.block_ref, &ctx.settings.marker)?;
    }

    host.notify(
        Status::Success,
        &format!("Imported {} highlight(s) from {}", records.len(), pdf_name),
    );
    Ok(())
}

/// Read the EDN sidecar next to the linked PDF, drop records whose
/// identities are already marked for the document's namespace (when
/// `check_duplicate` is on), embed the rest, and write the updated PDF
/// back in place. Finishes by re-importing so the notes page and the
/// sidecar reflect the annotations now present in the file.
///
/// Returns the updated PDF bytes when `export_embedded_copy` is set.
pub fn embed_annotations(
    host: &mut dyn Host,
    ctx: &mut CommandContext<'_>,
) -> Result<Option<Vec<u8>>> {
    ctx.settings.validate()?;
    let pdf_name = linked_pdf_name(host, ctx)?;
    let records = edn::from_edn(&ctx.session.read_text(&sidecar_name(&pdf_name, "edn"))?)?;

    let processed = if ctx.settings.check_duplicate {
        host.already_processed(&dedup_namespace(&pdf_name))?
    } else {
        HashSet::new()
    };
    let pending: Vec<EmbedRequest> = records
        .iter()
        .filter(|record| !processed.contains(&record.id))
        .map(EmbedRequest::from)
        .collect();
    if pending.is_empty() {
        host.notify(
            Status::Success,
            &format!("No pending annotations for {}", pdf_name),
        );
        return Ok(None);
    }

    let updated = embed_highlights(&ctx.session.read(&pdf_name)?, &pending)?;
    ctx.session.write(&pdf_name, &updated)?;
    host.notify(
        Status::Success,
        &format!("Embedded {} annotation(s) into {}", pending.len(), pdf_name),
    );

    // The file's annotation set changed; re-import so the notes page,
    // the sidecar, and the dedup marks describe what is actually in
    // the PDF now.
    import_annotations(host, ctx)?;

    Ok(ctx.settings.export_embedded_copy.then_some(updated))
}

fn linked_pdf_name(host: &dyn Host, ctx: &CommandContext<'_>) -> Result<String> {
    let content = host.block_content(&ctx.block_ref)?.ok_or_else(|| {
        Error::MissingAsset(format!("block {} has no content", ctx.block_ref))
    })?;
    let path = resolve_pdf_path(&content).ok_or_else(|| {
        Error::MissingAsset(format!("block {} links no PDF", ctx.block_ref))
    })?;
    Ok(file_name(&path).to_string())
}
