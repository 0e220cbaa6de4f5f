use mongodb::{bson::doc, Database, IndexModel};

pub async fn ensure_indexes(db: &Database) -> Result<(), String> {
    // alerts: list views query by user, the monitor groups by ticker
    {
        let col = db.collection::<mongodb::bson::Document>("alerts");

        let by_user = IndexModel::builder().keys(doc! { "user_id": 1 }).build();
        col.create_index(by_user, None)
            .await
            .map_err(|e| e.to_string())?;

        let by_ticker = IndexModel::builder().keys(doc! { "ticker": 1 }).build();
        let _ = col.create_index(by_ticker, None).await;
    }

    Ok(())
}
