// Rule endpoints

use crate::client::Client;
use crate::error::Error;
use crate::models::{Rule, RuleList};

impl Client {
    /// Routing rules in evaluation order.
    ///
    /// `GET /rules`
    pub async fn list_rules(&self) -> Result<Vec<Rule>, Error> {
        let list: RuleList = self.get(&["rules"]).await?;
        Ok(list.rules)
    }
}
