//! labelhive demo: one requester funds a task, two workers label it,
//! then one worker cashes out.

use std::sync::Arc;

use labelhive_core::app::Marketplace;
use labelhive_core::domain::{Address, TaskDraft};
use labelhive_core::impls::{DevPaymentVerifier, DevPayoutNetwork, DevUploadAuthorizer};
use labelhive_core::ports::SystemClock;
use labelhive_core::store::InMemoryMarket;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    tracing::info!("labelhive demo starting");

    // (A) Wire the marketplace with the dev collaborators.
    let clock = Arc::new(SystemClock);
    let market = Marketplace::new(
        Arc::new(InMemoryMarket::new(clock.clone())),
        Arc::new(DevPaymentVerifier::new()),
        Arc::new(DevPayoutNetwork::new()),
        Arc::new(DevUploadAuthorizer::new("labelhive-dev", clock)),
    );
    let market = Arc::new(market);

    // (B) A requester signs in, gets an upload grant, and funds a task.
    let requester = market
        .signin_requester(Address::new("req-9f3a7c"))
        .await?;
    let grant = market.presign_upload(requester).await?;
    println!("upload grant: key={} max_bytes={}", grant.key, grant.max_bytes);

    let draft = TaskDraft::new(1_000_000, "payment-sig-0001")
        .with_title("Pick the best thumbnail for this video")
        .with_image("https://img.example/thumb-a.jpg")
        .with_image("https://img.example/thumb-b.jpg")
        .with_image("https://img.example/thumb-c.jpg");
    let task = market.create_task(requester, draft).await?;
    println!("task created: {task}");

    // (C) Two workers label concurrently until nothing is left.
    let mut joins = Vec::new();
    for address in ["wrk-alice", "wrk-bob"] {
        let market = market.clone();
        joins.push(tokio::spawn(async move {
            let worker = market.signin_worker(Address::new(address)).await?;
            let mut answered = 0u32;
            while let Some(view) = market.next_task(worker).await? {
                // Pretend to deliberate, then pick the first option.
                let receipt = market.submit(worker, view.id, view.options[0].id).await?;
                answered += 1;
                println!("{address} answered {} for {}", view.id, receipt.reward_share);
            }
            println!("{address}: no more tasks left ({answered} answered)");
            Ok::<_, labelhive_core::MarketError>(worker)
        }));
    }
    let mut workers = Vec::new();
    for join in joins {
        workers.push(join.await??);
    }

    // (D) The requester inspects the per-option tallies.
    let results = market.task_results(requester, task).await?;
    println!("results: {}", serde_json::to_string_pretty(&results)?);

    // (E) The first worker cashes out.
    let worker = workers[0];
    let balance = market.balance(worker).await?;
    println!(
        "balance before payout: pending={} locked={}",
        balance.pending_amount, balance.locked_amount
    );

    let amount = market.request_payout(worker).await?;
    println!("payout processing: amount={amount}");

    let balance = market.balance(worker).await?;
    println!(
        "balance after payout: pending={} locked={}",
        balance.pending_amount, balance.locked_amount
    );

    Ok(())
}
