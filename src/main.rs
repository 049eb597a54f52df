//! Board Cache Demo
//!
//! Drives the stores against in-memory gateways and prints the column order
//! after each step. Usage: `board-cache [config.json]`

use std::sync::Arc;
use std::time::Duration;

use board_cache::gateway::MemoryGateway;
use board_cache::models::{Board, Column, CreateBoard, CreateColumn, CreateTag, Tag};
use board_cache::{selectors, BoardStore, ColumnStore, ErrorStore, StoreConfig, TagStore};

fn print_order(step: &str, columns: &ColumnStore, boards: &BoardStore) {
    let names: Vec<String> =
        selectors::ordered_in_current_board(&columns.snapshot(), boards.current_id())
            .iter()
            .map(|column| column.name.clone())
            .collect();
    println!("{:<28} {}", step, names.join(" -> "));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    board_logger::init(&config.log)?;
    tracing::info!(rollback = ?config.rollback, "starting board cache demo");

    let latency = Duration::from_millis(20);
    let board_gateway = Arc::new(MemoryGateway::<Board>::new().with_latency(latency));
    let column_gateway = Arc::new(MemoryGateway::<Column>::new().with_latency(latency));
    let tag_gateway = Arc::new(MemoryGateway::<Tag>::new().with_latency(latency));

    let errors = ErrorStore::new(config.error_capacity);
    let boards = BoardStore::new(board_gateway, &config).with_errors(errors.clone());
    let columns =
        Arc::new(ColumnStore::new(column_gateway.clone(), &config).with_errors(errors.clone()));
    let tags = TagStore::new(tag_gateway, &config).with_errors(errors.clone());

    let board = boards
        .create(CreateBoard {
            name: "Release".to_string(),
        })
        .await
        .ok_or("board creation failed")?;
    boards.select(Some(board.id));

    let mut ids = Vec::new();
    for name in ["Todo", "Doing", "Done"] {
        let column = columns
            .create(CreateColumn {
                board_id: board.id,
                name: name.to_string(),
                next_id: None,
            })
            .await
            .ok_or("column creation failed")?;
        ids.push(column.id);
    }
    tags.create(CreateTag {
        board_id: board.id,
        name: "Bug".to_string(),
        color: Some("#D73A4A".to_string()),
    })
    .await;
    print_order("created", &columns, &boards);

    columns.move_to(ids[0], None).await;
    print_order("moved Todo to the end", &columns, &boards);

    column_gateway.fail_next(1);
    let rejected = tokio::spawn({
        let columns = columns.clone();
        let (id, next_id) = (ids[2], ids[1]);
        async move { columns.move_to(id, Some(next_id)).await }
    });
    tokio::time::sleep(latency / 2).await;
    print_order("before rejection arrives", &columns, &boards);
    rejected.await?;
    print_order("after rollback", &columns, &boards);

    for notification in errors.all() {
        println!(
            "error: {} {} {}: {}",
            notification.operation,
            notification.kind,
            notification.target.as_deref().unwrap_or("-"),
            notification.error
        );
    }

    let tag_names: Vec<String> = selectors::in_current_board(&tags.snapshot(), boards.current_id())
        .iter()
        .map(|tag| tag.name.clone())
        .collect();
    println!("tags on {}: {}", board.name, tag_names.join(", "));

    Ok(())
}
