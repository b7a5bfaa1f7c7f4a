mod common;

use anyhow::Result;
use common::{StandardWallets, alice, balance, bob, date, movement, strict_service, test_service};
use fintrack::application::{ErrorKind, WalletUpdate};
use fintrack::domain::{MAX_AMOUNT_CENTS, MovementKind};

#[tokio::test]
async fn test_deposits_and_withdrawals_are_exact() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();
    let wallet = service
        .create_wallet(&user, "Bank".into(), 1000, None)
        .await?;

    // 0.10 + 0.20 style amounts must not drift
    let deposits = [10, 20, 30, 12345, 1];
    let withdrawals = [5, 99, 2000];
    for amount in deposits {
        service.deposit(&user, wallet.id, amount).await?;
    }
    for amount in withdrawals {
        service.withdraw(&user, wallet.id, amount).await?;
    }

    let expected = 1000 + deposits.iter().sum::<i64>() - withdrawals.iter().sum::<i64>();
    assert_eq!(balance(&service, &user, wallet.id).await, expected);
    Ok(())
}

#[tokio::test]
async fn test_withdraw_may_go_negative_by_default() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();
    let wallet = service.create_wallet(&user, "Cash".into(), 500, None).await?;

    let updated = service.withdraw(&user, wallet.id, 800).await?;
    assert_eq!(updated.balance, -300);
    Ok(())
}

#[tokio::test]
async fn test_deny_policy_rolls_back_overdraft() -> Result<()> {
    let (service, _temp) = strict_service().await?;
    let user = alice();
    let wallet = service.create_wallet(&user, "Cash".into(), 500, None).await?;

    let err = service.withdraw(&user, wallet.id, 800).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BusinessRuleViolation);
    assert_eq!(balance(&service, &user, wallet.id).await, 500);

    // An expense that would overdraw is refused and leaves no record behind
    let mut new = fintrack::application::NewMovement::new(800, date(2024, 5, 1));
    new.wallet = Some(wallet.id);
    assert!(service.create_expense(&user, new).await.is_err());
    assert_eq!(balance(&service, &user, wallet.id).await, 500);
    assert!(
        service
            .list_movements(&user, MovementKind::Expense, &Default::default())
            .await?
            .is_empty()
    );
    Ok(())
}

#[tokio::test]
async fn test_transfer_balance_primitive() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();
    let wallets = StandardWallets::create(&service, &user).await?;

    let (source, destination) = service
        .transfer_balance(&user, wallets.bank.id, wallets.cash.id, 2500)
        .await?;
    assert_eq!(source.balance, 7500);
    assert_eq!(destination.balance, 7500);

    let err = service
        .transfer_balance(&user, wallets.bank.id, wallets.bank.id, 100)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BusinessRuleViolation);
    Ok(())
}

#[tokio::test]
async fn test_ledger_primitives_reject_out_of_range_amounts() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();
    let wallets = StandardWallets::create(&service, &user).await?;
    let (bank, cash) = (wallets.bank.id, wallets.cash.id);

    for amount in [MAX_AMOUNT_CENTS + 1, i64::MAX] {
        let err = service.deposit(&user, bank, amount).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);

        let err = service.withdraw(&user, bank, amount).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);

        let err = service
            .transfer_balance(&user, bank, cash, amount)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }
    assert_eq!(balance(&service, &user, bank).await, 10000);
    assert_eq!(balance(&service, &user, cash).await, 5000);

    // The largest valid amount still goes through
    let wallet = service.deposit(&user, bank, MAX_AMOUNT_CENTS).await?;
    assert_eq!(wallet.balance, 10000 + MAX_AMOUNT_CENTS);
    Ok(())
}

#[tokio::test]
async fn test_wallet_titles_unique_per_user() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.create_wallet(&alice(), "Bank".into(), 0, None).await?;

    let err = service
        .create_wallet(&alice(), " Bank ".into(), 0, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);

    // Another user may reuse the title
    service.create_wallet(&bob(), "Bank".into(), 0, None).await?;
    Ok(())
}

#[tokio::test]
async fn test_wallet_validation() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();

    let err = service
        .create_wallet(&user, "   ".into(), 0, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);

    let err = service
        .create_wallet(&user, "Bank".into(), 0, Some("blue".into()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);

    let wallet = service
        .create_wallet(&user, "Bank".into(), 0, Some("#112233".into()))
        .await?;
    assert_eq!(wallet.color, "#112233");
    Ok(())
}

#[tokio::test]
async fn test_wallets_are_scoped_by_owner() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let wallet = service.create_wallet(&alice(), "Bank".into(), 100, None).await?;

    let err = service.get_wallet(&bob(), wallet.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = service.deposit(&bob(), wallet.id, 100).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert!(service.list_wallets(&bob()).await?.is_empty());
    assert_eq!(balance(&service, &alice(), wallet.id).await, 100);
    Ok(())
}

#[tokio::test]
async fn test_update_wallet_keeps_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();
    let wallets = StandardWallets::create(&service, &user).await?;

    let updated = service
        .update_wallet(
            &user,
            wallets.bank.id,
            WalletUpdate {
                title: Some("Checking".into()),
                color: Some("#00ff00".into()),
            },
        )
        .await?;
    assert_eq!(updated.title, "Checking");
    assert_eq!(updated.balance, 10000);

    let err = service
        .update_wallet(
            &user,
            wallets.bank.id,
            WalletUpdate {
                title: Some("Cash".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);

    let titles: Vec<String> = service
        .list_wallets(&user)
        .await?
        .into_iter()
        .map(|w| w.title)
        .collect();
    assert_eq!(titles, vec!["Cash", "Checking"]);
    Ok(())
}

#[tokio::test]
async fn test_delete_wallet_detaches_records() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();
    let wallets = StandardWallets::create(&service, &user).await?;

    let expense = movement(
        &service,
        &user,
        MovementKind::Expense,
        Some(wallets.cash.id),
        1000,
        date(2024, 5, 1),
    )
    .await;
    let transfer = service
        .create_transfer(&user, wallets.bank.id, wallets.cash.id, 2000, date(2024, 5, 2), None)
        .await?;

    service.delete_wallet(&user, wallets.cash.id).await?;

    let expense = service
        .get_movement(&user, MovementKind::Expense, expense.id)
        .await?;
    assert_eq!(expense.wallet, None);
    let transfer = service.get_transfer(&user, transfer.id).await?;
    assert_eq!(transfer.source_wallet, Some(wallets.bank.id));
    assert_eq!(transfer.destination_wallet, None);
    Ok(())
}
