use super::{non_blank_id, Repository};
use crate::derived::is_active_membership;
use crate::models::ClientOverview;

impl Repository {
    /// The client detail screen in one call: the client plus its memberships,
    /// sales and product purchases, loaded concurrently. `None` when the
    /// client does not exist or could not be loaded; the sub-lists degrade to
    /// empty on their own errors.
    pub async fn client_overview(&self, client_id: &str) -> Option<ClientOverview> {
        let client_id = non_blank_id(client_id)?;

        let (client, memberships, sales, products) = tokio::join!(
            self.get_client_by_id(client_id),
            self.list_memberships_by_client(client_id),
            self.list_sales_by_client(client_id),
            self.list_product_purchases_by_client(client_id, None),
        );

        let client = client?;
        let active_membership_count = memberships
            .iter()
            .filter(|m| is_active_membership(m))
            .count();
        let visit_count = sales.len();

        Some(ClientOverview {
            client,
            memberships,
            sales,
            products,
            active_membership_count,
            visit_count,
        })
    }
}
