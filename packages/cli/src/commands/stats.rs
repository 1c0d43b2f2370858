use common::Task;
use sea_orm::DatabaseConnection;
use server::ledger;

/// Print the non-skip votes of every system in `task`, fewest first.
pub async fn vote_counts(db: &DatabaseConnection, task: &Task) -> anyhow::Result<()> {
    let mut counts: Vec<(String, u64)> = ledger::votes_per_system(db, task, &[])
        .await?
        .into_iter()
        .collect();
    counts.sort_by(|(a_id, a), (b_id, b)| a.cmp(b).then_with(|| a_id.cmp(b_id)));

    println!("{:<40} {:>8}", "system", "votes");
    for (system_id, count) in counts {
        println!("{system_id:<40} {count:>8}");
    }
    Ok(())
}

/// Print the ledger totals.
pub async fn stats(db: &DatabaseConnection) -> anyhow::Result<()> {
    let (votes, sessions, counted_votes, counted_sessions, per_category, histogram) = tokio::try_join!(
        ledger::vote_count(db, false),
        ledger::session_count(db, false),
        ledger::vote_count(db, true),
        ledger::session_count(db, true),
        ledger::votes_per_category(db),
        ledger::prompt_vote_histogram(db),
    )?;

    println!("Votes: {votes} ({counted_votes} without skips)");
    println!("Sessions: {sessions} ({counted_sessions} with non-skip votes)");

    println!();
    println!("Votes per category:");
    for (value, count) in per_category {
        println!("  {value}: {count}");
    }

    println!();
    println!("Prompts by number of votes:");
    for (votes, prompts) in histogram {
        println!("  {votes:>4} votes: {prompts} prompts");
    }
    Ok(())
}
