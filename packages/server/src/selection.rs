//! Battle Selector.
//!
//! Picks which two outputs an annotator should compare next. Selection is a
//! greedy load balancer over live coverage counts read from the ledger:
//! outputs of the least-voted systems on the least-voted prompts go first,
//! ties are broken uniformly at random, and nothing the session has already
//! voted on (or asked to skip) is offered again.

use std::collections::{BTreeMap, HashMap, HashSet};

use common::{OutputKey, Task};
use rand::Rng;
use rand::seq::SliceRandom;
use sea_orm::{ConnectionTrait, DbErr};
use tracing::debug;

use crate::entity::{output, prompt};
use crate::{catalog, ledger};

/// Counted (non-skip) votes per system and per prompt of one task.
#[derive(Debug, Default, Clone)]
pub struct Coverage {
    pub systems: HashMap<String, u64>,
    pub prompts: HashMap<String, u64>,
}

impl Coverage {
    fn system(&self, system_id: &str) -> u64 {
        self.systems.get(system_id).copied().unwrap_or(0)
    }

    fn prompt(&self, prompt_id: &str) -> u64 {
        self.prompts.get(prompt_id).copied().unwrap_or(0)
    }

    /// Account for a battle that is about to be shown, so later picks in the
    /// same batch spread over other systems and prompts.
    fn record(&mut self, prompt_id: &str, system_id_a: &str, system_id_b: &str) {
        *self.prompts.entry(prompt_id.to_string()).or_default() += 1;
        *self.systems.entry(system_id_a.to_string()).or_default() += 1;
        *self.systems.entry(system_id_b.to_string()).or_default() += 1;
    }
}

/// Two outputs of the same prompt, in presentation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub prompt_id: String,
    pub system_id_a: String,
    pub text_a: String,
    pub system_id_b: String,
    pub text_b: String,
}

/// A battle ready to be served.
#[derive(Debug, Clone)]
pub struct Battle {
    pub prompt: prompt::Model,
    pub system_id_a: String,
    pub output_a: String,
    pub system_id_b: String,
    pub output_b: String,
}

/// Plan up to `limit` battles from the outputs of one task.
///
/// An output is eligible unless its key is in `excluded`. Each battle pairs
/// the eligible output with the lowest (system votes, prompt votes) with the
/// eligible output of another system on the same prompt whose system has the
/// fewest votes. Outputs with identical text are never paired, and no output
/// appears twice in the result.
pub fn plan_battles<R: Rng + ?Sized>(
    outputs: &[output::Model],
    coverage: &Coverage,
    excluded: &HashSet<OutputKey>,
    limit: usize,
    randomize_sides: bool,
    rng: &mut R,
) -> Vec<Pairing> {
    let mut by_prompt: BTreeMap<&str, Vec<&output::Model>> = BTreeMap::new();
    for output in outputs {
        let key = OutputKey::new(output.prompt_id.as_str(), output.system_id.as_str());
        if !excluded.contains(&key) {
            by_prompt
                .entry(output.prompt_id.as_str())
                .or_default()
                .push(output);
        }
    }

    let mut anchors: Vec<&output::Model> = by_prompt.values().flatten().copied().collect();
    anchors.shuffle(rng);

    let mut coverage = coverage.clone();
    let mut used: HashSet<(&str, &str)> = HashSet::new();
    let mut battles = Vec::with_capacity(limit.min(anchors.len() / 2));

    while battles.len() < limit {
        anchors.retain(|o| !used.contains(&(o.prompt_id.as_str(), o.system_id.as_str())));
        // Stable sort keeps the shuffled order among equal counts.
        anchors.sort_by_key(|o| (coverage.system(&o.system_id), coverage.prompt(&o.prompt_id)));

        let picked = anchors.iter().find_map(|anchor| {
            let mut partners: Vec<&output::Model> = by_prompt[anchor.prompt_id.as_str()]
                .iter()
                .copied()
                .filter(|o| {
                    o.system_id != anchor.system_id
                        && o.text != anchor.text
                        && !used.contains(&(o.prompt_id.as_str(), o.system_id.as_str()))
                })
                .collect();
            partners.shuffle(rng);
            partners
                .into_iter()
                .min_by_key(|o| coverage.system(&o.system_id))
                .map(|partner| (*anchor, partner))
        });

        let Some((anchor, partner)) = picked else {
            break;
        };

        used.insert((anchor.prompt_id.as_str(), anchor.system_id.as_str()));
        used.insert((partner.prompt_id.as_str(), partner.system_id.as_str()));
        coverage.record(&anchor.prompt_id, &anchor.system_id, &partner.system_id);

        let (a, b) = if randomize_sides && rng.random_bool(0.5) {
            (partner, anchor)
        } else {
            (anchor, partner)
        };

        battles.push(Pairing {
            prompt_id: a.prompt_id.clone(),
            system_id_a: a.system_id.clone(),
            text_a: a.text.clone(),
            system_id_b: b.system_id.clone(),
            text_b: b.text.clone(),
        });
    }

    battles
}

/// Select up to `limit` battles of `task` for a session.
///
/// `ignored` is the client's advisory exclusion list (battles queued or in
/// flight); outputs the session already voted on are excluded from the
/// ledger regardless. An empty result means nothing is left to annotate.
pub async fn select_battles<C: ConnectionTrait>(
    db: &C,
    task: &Task,
    session_id: &str,
    ignored: &HashSet<OutputKey>,
    limit: usize,
    randomize_sides: bool,
) -> Result<Vec<Battle>, DbErr> {
    if limit == 0 {
        return Ok(vec![]);
    }

    let (prompts, outputs, systems, prompt_counts, mut excluded) = tokio::try_join!(
        catalog::prompts_for_task(db, task),
        catalog::outputs_for_task(db, task),
        ledger::system_vote_counts(db, task),
        ledger::prompt_vote_counts(db, task),
        ledger::session_voted_outputs(db, task, session_id),
    )?;

    let voted = excluded.len();
    excluded.extend(ignored.iter().cloned());

    let coverage = Coverage {
        systems,
        prompts: prompt_counts,
    };

    let pairings = plan_battles(
        &outputs,
        &coverage,
        &excluded,
        limit,
        randomize_sides,
        &mut rand::rng(),
    );

    debug!(
        %task,
        outputs = outputs.len(),
        voted,
        excluded = excluded.len(),
        selected = pairings.len(),
        "Selected battles"
    );

    let prompts: HashMap<String, prompt::Model> =
        prompts.into_iter().map(|p| (p.id.clone(), p)).collect();

    Ok(pairings
        .into_iter()
        .filter_map(|pairing| {
            let prompt = prompts.get(&pairing.prompt_id)?.clone();
            Some(Battle {
                prompt,
                system_id_a: pairing.system_id_a,
                output_a: pairing.text_a,
                system_id_b: pairing.system_id_b,
                output_b: pairing.text_b,
            })
        })
        .collect())
}
