//! The interactive loop tying form, predictor, session and store together.

use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::{error, info};

use crate::form::{Form, render_chart, render_result, render_stats};
use crate::predictor::Predictor;
use crate::record::{ClinicalInput, Sex};
use crate::session::{HistoryEntry, Session};
use crate::store::{PredictionLogEntry, PredictionStore};

/// Handles one trigger: predict, record, render, then log.
///
/// The result is rendered and recorded before the store is written, so a
/// failed write leaves both in place; the write error is returned as the
/// second element.
pub fn interact<W: Write>(
    out: &mut W,
    predictor: &Predictor,
    session: &mut Session,
    store: &mut dyn PredictionStore,
    sex: Sex,
    input: ClinicalInput,
) -> Result<(HistoryEntry, Result<()>)> {
    let entry = session.submit(predictor, sex, input)?;
    render_result(out, &entry)?;
    render_chart(out, &entry.prediction())?;
    render_stats(out, session.history().stats().as_ref())?;
    out.flush()?;

    let logged = store.add(&PredictionLogEntry::new(sex, &input, &entry.prediction()));
    Ok((entry, logged))
}

/// Runs the form until `exit` or end of input and returns the session.
///
/// Each round starts from the previous round's values. A store failure ends
/// only that round.
pub fn run<R: BufRead, W: Write>(
    form: &mut Form<R, W>,
    predictor: &Predictor,
    store: &mut dyn PredictionStore,
) -> Result<Session> {
    let mut session = Session::new();
    let mut sex = Sex::Female;
    let mut last = ClinicalInput::default();

    loop {
        let Some((chosen, input)) = form.fill(sex, &last)? else {
            break;
        };
        sex = chosen;
        last = input;
        if !form.confirm()? {
            break;
        }

        let (entry, logged) = interact(form.output(), predictor, &mut session, store, sex, input)?;
        match logged {
            Ok(()) => info!(
                outcome = entry.outcome.as_str(),
                probability = entry.probability,
                store = %store.describe(),
                "prediction logged"
            ),
            Err(err) => error!(
                store = %store.describe(),
                "failed to log prediction: {err:#}"
            ),
        }
        writeln!(form.output())?;
    }
    Ok(session)
}
