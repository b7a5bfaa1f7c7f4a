mod common;

use anyhow::Result;
use common::{StandardWallets, alice, bob, date, movement, test_service};
use fintrack::application::{ErrorKind, NewMovement};
use fintrack::domain::{FeedEntry, MovementKind, TransactionType};

#[tokio::test]
async fn test_same_day_expense_and_income() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();

    movement(&service, &user, MovementKind::Expense, None, 2000, date(2024, 5, 1)).await;
    movement(&service, &user, MovementKind::Income, None, 5000, date(2024, 5, 1)).await;

    let feed = service
        .transaction_feed(&user, 2024, Some(5), TransactionType::All)
        .await?;
    let groups: Vec<_> = feed.into_iter().collect();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].date, date(2024, 5, 1));
    assert_eq!(groups[0].amount, 3000);
    assert_eq!(groups[0].transactions.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_bogus_type_is_invalid_argument() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service
        .transaction_feed_str(&alice(), 2024, Some(5), "bogus")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    Ok(())
}

#[tokio::test]
async fn test_bad_month_is_invalid_argument() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service
        .transaction_feed(&alice(), 2024, Some(13), TransactionType::All)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    Ok(())
}

#[tokio::test]
async fn test_transfers_listed_but_neutral() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();
    let wallets = StandardWallets::create(&service, &user).await?;

    movement(
        &service,
        &user,
        MovementKind::Expense,
        Some(wallets.bank.id),
        1000,
        date(2024, 5, 9),
    )
    .await;
    service
        .create_transfer(&user, wallets.bank.id, wallets.cash.id, 2500, date(2024, 5, 9), None)
        .await?;
    movement(
        &service,
        &user,
        MovementKind::Income,
        Some(wallets.cash.id),
        400,
        date(2024, 5, 9),
    )
    .await;

    let feed = service
        .transaction_feed(&user, 2024, Some(5), TransactionType::All)
        .await?;
    let group = feed.get(date(2024, 5, 9)).unwrap();
    assert_eq!(group.amount, -1000 + 400);

    // Expenses, then incomes, then transfers
    let types: Vec<_> = group
        .transactions
        .iter()
        .map(|t| t.transaction_type())
        .collect();
    assert_eq!(
        types,
        vec![
            TransactionType::Expense,
            TransactionType::Income,
            TransactionType::Transfer
        ]
    );
    assert_eq!(group.transactions[2].title(), "Transfer: Bank → Cash");
    Ok(())
}

#[tokio::test]
async fn test_type_filter_and_period() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();
    let wallets = StandardWallets::create(&service, &user).await?;

    movement(&service, &user, MovementKind::Expense, None, 100, date(2024, 4, 30)).await;
    movement(&service, &user, MovementKind::Expense, None, 200, date(2024, 5, 31)).await;
    movement(&service, &user, MovementKind::Income, None, 300, date(2024, 6, 1)).await;
    movement(&service, &user, MovementKind::Income, None, 999, date(2023, 5, 15)).await;
    service
        .create_transfer(&user, wallets.bank.id, wallets.cash.id, 50, date(2024, 5, 15), None)
        .await?;

    let may = service
        .transaction_feed(&user, 2024, Some(5), TransactionType::All)
        .await?;
    let dates: Vec<_> = may.iter().map(|g| g.date).collect();
    assert_eq!(dates, vec![date(2024, 5, 15), date(2024, 5, 31)]);

    let expenses = service
        .transaction_feed(&user, 2024, None, TransactionType::Expense)
        .await?;
    assert_eq!(expenses.len(), 2);
    assert_eq!(expenses.total(), -300);
    assert!(
        expenses
            .iter()
            .flat_map(|g| g.transactions.iter())
            .all(|t| matches!(t, FeedEntry::Expense(_)))
    );

    let transfers = service
        .transaction_feed(&user, 2024, None, TransactionType::Transfer)
        .await?;
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers.total(), 0);

    let year = service
        .transaction_feed(&user, 2024, None, TransactionType::All)
        .await?;
    assert_eq!(year.len(), 4);
    assert_eq!(year.total(), -100 - 200 + 300);
    Ok(())
}

#[tokio::test]
async fn test_feed_is_scoped_and_recomputed() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();

    movement(&service, &bob(), MovementKind::Income, None, 700, date(2024, 5, 1)).await;
    let feed = service
        .transaction_feed(&user, 2024, Some(5), TransactionType::All)
        .await?;
    assert!(feed.is_empty());

    let income = movement(&service, &user, MovementKind::Income, None, 700, date(2024, 5, 1)).await;
    let feed = service
        .transaction_feed(&user, 2024, Some(5), TransactionType::All)
        .await?;
    assert_eq!(feed.total(), 700);

    service.delete_income(&user, income.id).await?;
    let feed = service
        .transaction_feed(&user, 2024, Some(5), TransactionType::All)
        .await?;
    assert!(feed.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_entries_carry_display_data() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();
    let (wallets, groceries, _salary) = StandardWallets::with_categories(&service, &user).await?;

    let mut new = NewMovement::new(1250, date(2024, 5, 4));
    new.title = Some("Market".into());
    new.category = Some(groceries.id);
    new.wallet = Some(wallets.cash.id);
    service.create_expense(&user, new).await?;

    let feed = service
        .transaction_feed(&user, 2024, Some(5), TransactionType::Expense)
        .await?;
    let json = serde_json::to_value(&feed)?;
    let entry = &json[0]["transactions"][0];
    assert_eq!(json[0]["date"], "2024-05-04");
    assert_eq!(json[0]["amount"], -1250);
    assert_eq!(entry["transaction_type"], "expense");
    assert_eq!(entry["title"], "Market");
    assert_eq!(entry["category"]["title"], "Groceries");
    assert_eq!(entry["category"]["color_code"], "#000000");
    assert_eq!(entry["wallet"]["title"], "Cash");

    // A deleted wallet simply disappears from the entry
    service.delete_wallet(&user, wallets.cash.id).await?;
    let feed = service
        .transaction_feed(&user, 2024, Some(5), TransactionType::Expense)
        .await?;
    let group = feed.get(date(2024, 5, 4)).unwrap();
    match &group.transactions[0] {
        FeedEntry::Expense(entry) => assert!(entry.wallet.is_none()),
        other => panic!("unexpected entry {:?}", other),
    }
    Ok(())
}
