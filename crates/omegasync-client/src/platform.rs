//! [`Platform`] implementation over the omegaUp HTTP API.

use async_trait::async_trait;
use omegasync_core::{
    ContestProblem, Ident, Member, Payload, Platform, Presence, Relation, ResourceKind, Result,
    SyncError, Tag,
};
use serde_json::Value;

use crate::client::{ApiFailure, OmegaUpClient, Outcome};

/// API methods backing one relation.
struct RelationApi {
    list: &'static str,
    add: &'static str,
    remove: &'static str,
    member_param: &'static str,
}

fn relation_api(relation: Relation) -> RelationApi {
    let (list, add, remove, member_param) = match relation {
        Relation::Admins => ("admins", "addAdmin", "removeAdmin", "usernameOrEmail"),
        Relation::AdminGroups => ("admins", "addGroupAdmin", "removeGroupAdmin", "group"),
        Relation::Contestants => ("users", "addUser", "removeUser", "usernameOrEmail"),
        Relation::ContestantGroups => ("users", "addGroup", "removeGroup", "group"),
        Relation::Tags => ("tags", "addTag", "removeTag", "name"),
        Relation::Problems => ("problems", "addProblem", "removeProblem", "problem_alias"),
    };
    RelationApi {
        list,
        add,
        remove,
        member_param,
    }
}

fn endpoint(kind: ResourceKind, method: &str) -> String {
    format!("/api/{kind}/{method}/")
}

fn alias_param(kind: ResourceKind, alias: &Ident) -> (String, String) {
    (format!("{kind}_alias"), alias.to_string())
}

/// 403 on a resource means "exists, but not yours".
fn classify(failure: ApiFailure, kind: ResourceKind, alias: &Ident) -> SyncError {
    match failure.code {
        Some(403) => SyncError::permission(kind, alias.as_str(), failure.message),
        _ => failure.into_error(),
    }
}

impl OmegaUpClient {
    async fn resource_call(
        &self,
        kind: ResourceKind,
        method: &str,
        payload: &Payload,
        alias_key: String,
    ) -> Result<()> {
        let mut params: Vec<(String, String)> = payload
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        params.push((alias_key, payload.alias.to_string()));

        match self
            .call(&endpoint(kind, method), params, payload.contents.as_ref())
            .await?
        {
            Outcome::Ok(_) => Ok(()),
            Outcome::Failed(failure) => Err(classify(failure, kind, &payload.alias)),
        }
    }

    async fn member_call(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        method: &str,
        mut params: Vec<(String, String)>,
    ) -> Result<()> {
        params.insert(0, alias_param(kind, alias));
        match self.call(&endpoint(kind, method), params, None).await? {
            Outcome::Ok(_) => Ok(()),
            Outcome::Failed(failure) => Err(classify(failure, kind, alias)),
        }
    }
}

fn member_params(api: &RelationApi, member: &Member, with_attributes: bool) -> Vec<(String, String)> {
    let mut params = vec![(api.member_param.to_string(), member.id().to_string())];
    if with_attributes {
        match member {
            Member::Tag(tag) => params.push(("public".to_string(), tag.public.to_string())),
            Member::Problem(problem) => {
                params.push(("points".to_string(), problem.points.to_string()));
                params.push(("order_in_contest".to_string(), problem.order.to_string()));
            }
            Member::Name(_) => {}
        }
    }
    params
}

/// Extracts the current members of `relation` from a listing response.
fn parse_members(relation: Relation, response: &Value) -> Vec<Member> {
    let items = |key: &str| response[key].as_array().cloned().unwrap_or_default();
    let is_admin = |item: &Value| item["role"].as_str() == Some("admin");
    let name = |item: &Value, key: &str| item[key].as_str().map(|s| Member::Name(Ident::new(s)));

    match relation {
        // Owners show up with role "owner" and are never managed.
        Relation::Admins => items("admins")
            .iter()
            .filter(|i| is_admin(*i))
            .filter_map(|i| name(i, "username"))
            .collect(),
        Relation::AdminGroups => items("group_admins")
            .iter()
            .filter(|i| is_admin(*i))
            .filter_map(|i| name(i, "alias"))
            .collect(),
        Relation::Contestants => items("users")
            .iter()
            .filter_map(|i| name(i, "username"))
            .collect(),
        Relation::ContestantGroups => items("groups")
            .iter()
            .filter_map(|i| name(i, "alias"))
            .collect(),
        Relation::Tags => items("tags")
            .iter()
            .filter_map(|i| {
                let public = i["public"]
                    .as_bool()
                    .or_else(|| i["public"].as_i64().map(|p| p != 0))
                    .unwrap_or(false);
                i["name"].as_str().map(|n| Member::Tag(Tag::new(n, public)))
            })
            .collect(),
        Relation::Problems => items("problems")
            .iter()
            .filter_map(|i| {
                let alias = i["alias"].as_str()?;
                let points = i["points"].as_f64().unwrap_or(0.0);
                let order = i["order"].as_u64().and_then(|o| u32::try_from(o).ok()).unwrap_or(0);
                Some(Member::Problem(ContestProblem::new(alias, points, order)))
            })
            .collect(),
    }
}

#[async_trait]
impl Platform for OmegaUpClient {
    async fn probe(&self, kind: ResourceKind, alias: &Ident) -> Result<Presence> {
        let params = vec![alias_param(kind, alias)];
        match self.call(&endpoint(kind, "details"), params, None).await? {
            Outcome::Ok(details) => Ok(Presence::Present(details)),
            Outcome::Failed(failure) if failure.is_not_found() => Ok(Presence::Absent),
            Outcome::Failed(failure) => Err(classify(failure, kind, alias)),
        }
    }

    async fn create(&self, kind: ResourceKind, payload: &Payload) -> Result<()> {
        let alias_key = match kind {
            ResourceKind::Problem => "problem_alias",
            ResourceKind::Contest => "alias",
        };
        self.resource_call(kind, "create", payload, alias_key.to_string())
            .await
    }

    async fn update(&self, kind: ResourceKind, payload: &Payload) -> Result<()> {
        self.resource_call(kind, "update", payload, format!("{kind}_alias"))
            .await
    }

    async fn list_members(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        relation: Relation,
    ) -> Result<Vec<Member>> {
        let api = relation_api(relation);
        let response = self
            .query(&endpoint(kind, api.list), vec![alias_param(kind, alias)])
            .await?;
        Ok(parse_members(relation, &response))
    }

    async fn add_member(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        relation: Relation,
        member: &Member,
    ) -> Result<()> {
        let api = relation_api(relation);
        self.member_call(kind, alias, api.add, member_params(&api, member, true))
            .await
    }

    async fn remove_member(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        relation: Relation,
        member: &Member,
    ) -> Result<()> {
        let api = relation_api(relation);
        self.member_call(kind, alias, api.remove, member_params(&api, member, false))
            .await
    }

    /// Only contest problems carry attributes; `addProblem` upserts them.
    async fn update_member(
        &self,
        kind: ResourceKind,
        alias: &Ident,
        relation: Relation,
        member: &Member,
    ) -> Result<()> {
        if relation != Relation::Problems {
            return Err(SyncError::invalid_resource(format!(
                "{relation} have no attributes to update"
            )));
        }
        let api = relation_api(relation);
        self.member_call(kind, alias, api.add, member_params(&api, member, true))
            .await
    }
}
