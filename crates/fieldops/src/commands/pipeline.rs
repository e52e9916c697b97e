//! `pipeline` command: the opportunity board.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use fieldops_core::model::catalog::OPPORTUNITIES;
use fieldops_core::{CoreError, PIPELINE_STAGES, Pipeline, RestSource};

use crate::cli::{GlobalOpts, PipelineArgs, PipelineCommand};
use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Debug, Serialize)]
struct CardInfo {
    stage: String,
    position: usize,
    id: String,
    name: String,
    customer: String,
    value: String,
}

#[derive(Tabled)]
struct CardRow {
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl From<&CardInfo> for CardRow {
    fn from(c: &CardInfo) -> Self {
        Self {
            stage: c.stage.clone(),
            position: c.position,
            id: c.id.clone(),
            name: c.name.clone(),
            customer: c.customer.clone(),
            value: c.value.clone(),
        }
    }
}

fn board_cards(pipeline: &Pipeline) -> Vec<CardInfo> {
    let mut cards = Vec::new();
    for (stage, ids) in pipeline.board().stages() {
        for (position, id) in ids.iter().enumerate() {
            let (name, customer, value) = pipeline.card(id).map_or_else(Default::default, |e| {
                (e.label(), e.display("customer"), e.display("value"))
            });
            cards.push(CardInfo {
                stage: stage.to_owned(),
                position,
                id: id.clone(),
                name,
                customer,
                value,
            });
        }
    }
    cards
}

pub async fn handle(session: &Session, args: PipelineArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let source = Arc::new(RestSource::new(Arc::clone(&session.client), &OPPORTUNITIES));
    let mut pipeline = Pipeline::new(&OPPORTUNITIES, PIPELINE_STAGES, source);
    pipeline.load().await?;

    match args.command {
        PipelineCommand::Show => {
            let cards = board_cards(&pipeline);
            let out = output::render_list(global.output, &cards, |c| CardRow::from(c), |c| c.id.clone())?;
            output::print_output(&out, global.quiet);
        }
        PipelineCommand::Move { id, to, position } => {
            let Some((from, _)) = pipeline.board().locate(&id) else {
                return Err(CoreError::NotFound {
                    entity_type: OPPORTUNITIES.noun.to_owned(),
                    identifier: id,
                }
                .into());
            };
            let from = from.to_owned();
            let index = position.unwrap_or_else(|| {
                pipeline.board().cards(&to).map_or(0, <[String]>::len)
            });
            let color = output::should_color(global.color);
            match pipeline.move_card(&id, &from, &to, index).await? {
                Some(change) => output::print_status(
                    &format!(
                        "Moved '{}' from {} to {} (position {})",
                        change.id, change.from, change.to, change.position
                    ),
                    global.quiet,
                    color,
                ),
                None => output::print_status(
                    &format!("'{id}' is already in {to}"),
                    global.quiet,
                    color,
                ),
            }
        }
    }
    Ok(())
}
