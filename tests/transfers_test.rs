mod common;

use anyhow::Result;
use common::{StandardWallets, alice, balance, bob, date, strict_service, test_service};
use fintrack::application::{AppError, ErrorKind, TransferUpdate};

#[tokio::test]
async fn test_create_and_delete_transfer() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();
    let wallets = StandardWallets::create(&service, &user).await?;
    let (w1, w2) = (wallets.bank.id, wallets.cash.id);

    let transfer = service
        .create_transfer(&user, w1, w2, 3000, date(2024, 5, 2), Some("ATM".into()))
        .await?;
    assert_eq!(balance(&service, &user, w1).await, 7000);
    assert_eq!(balance(&service, &user, w2).await, 8000);
    assert_eq!(transfer.description.as_deref(), Some("ATM"));

    service.delete_transfer(&user, transfer.id).await?;
    assert_eq!(balance(&service, &user, w1).await, 10000);
    assert_eq!(balance(&service, &user, w2).await, 5000);

    let err = service.get_transfer(&user, transfer.id).await.unwrap_err();
    assert!(matches!(err, AppError::TransferNotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_same_wallet_transfer_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();
    let wallets = StandardWallets::create(&service, &user).await?;

    let err = service
        .create_transfer(
            &user,
            wallets.bank.id,
            wallets.bank.id,
            3000,
            date(2024, 5, 2),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SameWalletTransfer));
    assert_eq!(err.kind(), ErrorKind::BusinessRuleViolation);
    assert_eq!(balance(&service, &user, wallets.bank.id).await, 10000);
    assert!(service.list_transfers(&user).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_non_positive_amount_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();
    let wallets = StandardWallets::create(&service, &user).await?;

    for amount in [0, -100] {
        let err = service
            .create_transfer(
                &user,
                wallets.bank.id,
                wallets.cash.id,
                amount,
                date(2024, 5, 2),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NonPositiveAmount(_)));
        assert_eq!(err.kind(), ErrorKind::BusinessRuleViolation);
    }
    assert_eq!(balance(&service, &user, wallets.bank.id).await, 10000);
    Ok(())
}

#[tokio::test]
async fn test_unknown_or_foreign_wallet_is_not_found() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();
    let wallets = StandardWallets::create(&service, &user).await?;
    let foreign = service.create_wallet(&bob(), "Bob".into(), 0, None).await?;

    let err = service
        .create_transfer(
            &user,
            wallets.bank.id,
            foreign.id,
            100,
            date(2024, 5, 2),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::WalletNotFound(_)));
    assert_eq!(balance(&service, &bob(), foreign.id).await, 0);
    assert_eq!(balance(&service, &user, wallets.bank.id).await, 10000);
    Ok(())
}

#[tokio::test]
async fn test_amount_update_reverses_then_reapplies() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();
    let wallets = StandardWallets::create(&service, &user).await?;
    let (w1, w2) = (wallets.bank.id, wallets.cash.id);

    let transfer = service
        .create_transfer(&user, w1, w2, 3000, date(2024, 5, 2), None)
        .await?;

    let updated = service
        .update_transfer(
            &user,
            transfer.id,
            TransferUpdate {
                amount: Some(4500),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.amount, 4500);
    assert_eq!(balance(&service, &user, w1).await, 5500);
    assert_eq!(balance(&service, &user, w2).await, 9500);

    // Description and date only: wallets untouched
    let updated = service
        .update_transfer(
            &user,
            transfer.id,
            TransferUpdate {
                description: Some("rent share".into()),
                date: Some(date(2024, 5, 3)),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.description.as_deref(), Some("rent share"));
    assert_eq!(updated.date, date(2024, 5, 3));
    assert_eq!(balance(&service, &user, w1).await, 5500);
    assert_eq!(balance(&service, &user, w2).await, 9500);

    let err = service
        .update_transfer(
            &user,
            transfer.id,
            TransferUpdate {
                amount: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BusinessRuleViolation);
    Ok(())
}

#[tokio::test]
async fn test_deleted_wallet_makes_reversal_one_sided() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();
    let wallets = StandardWallets::create(&service, &user).await?;

    let transfer = service
        .create_transfer(
            &user,
            wallets.bank.id,
            wallets.cash.id,
            3000,
            date(2024, 5, 2),
            None,
        )
        .await?;
    service.delete_wallet(&user, wallets.cash.id).await?;

    service.delete_transfer(&user, transfer.id).await?;
    assert_eq!(balance(&service, &user, wallets.bank.id).await, 10000);
    Ok(())
}

#[tokio::test]
async fn test_deny_policy_blocks_overdrawing_transfer() -> Result<()> {
    let (service, _temp) = strict_service().await?;
    let user = alice();
    let wallets = StandardWallets::create(&service, &user).await?;

    let err = service
        .create_transfer(
            &user,
            wallets.cash.id,
            wallets.bank.id,
            6000,
            date(2024, 5, 2),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds { .. }));

    // Both sides rolled back together
    assert_eq!(balance(&service, &user, wallets.cash.id).await, 5000);
    assert_eq!(balance(&service, &user, wallets.bank.id).await, 10000);
    assert!(service.list_transfers(&user).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_deny_policy_judges_amount_update_by_final_balances() -> Result<()> {
    let (service, _temp) = strict_service().await?;
    let user = alice();
    let source = service.create_wallet(&user, "Savings".into(), 10000, None).await?;
    let destination = service.create_wallet(&user, "Spending".into(), 0, None).await?;

    let transfer = service
        .create_transfer(&user, source.id, destination.id, 3000, date(2024, 5, 2), None)
        .await?;
    service.withdraw(&user, destination.id, 2000).await?;

    // Moving the old 3000 back would dip Spending to -2000 on the way,
    // but the end state is fine for both wallets.
    let updated = service
        .update_transfer(
            &user,
            transfer.id,
            TransferUpdate {
                amount: Some(3001),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.amount, 3001);
    assert_eq!(balance(&service, &user, source.id).await, 6999);
    assert_eq!(balance(&service, &user, destination.id).await, 1001);

    // Shrinking the transfer below what Spending already spent is refused
    let err = service
        .update_transfer(
            &user,
            transfer.id,
            TransferUpdate {
                amount: Some(1000),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InsufficientFunds {
            balance_after: -1000,
            ..
        }
    ));
    assert_eq!(balance(&service, &user, source.id).await, 6999);
    assert_eq!(balance(&service, &user, destination.id).await, 1001);
    assert_eq!(service.get_transfer(&user, transfer.id).await?.amount, 3001);
    Ok(())
}

#[tokio::test]
async fn test_list_transfers_newest_first() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = alice();
    let wallets = StandardWallets::create(&service, &user).await?;

    let first = service
        .create_transfer(&user, wallets.bank.id, wallets.cash.id, 100, date(2024, 5, 2), None)
        .await?;
    let second = service
        .create_transfer(&user, wallets.cash.id, wallets.bank.id, 200, date(2024, 5, 1), None)
        .await?;

    let ids: Vec<_> = service
        .list_transfers(&user)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert!(service.list_transfers(&bob()).await?.is_empty());
    Ok(())
}
