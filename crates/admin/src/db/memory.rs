//! In-memory implementation of every repository trait.
//!
//! Used by service and route tests, and handy for local development without
//! a database. State lives behind one `RwLock`, so each call is atomic with
//! respect to the others, and the same uniqueness rules as the Postgres
//! indexes are enforced at write time.
//!
//! Every repository call is appended to a journal so tests can assert which
//! store operations a service performed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use backoffice_core::{AdminId, BrandId, CategoryId, ItemId, PermissionId, RoleId};

use super::{
    AdminRepository, BrandRepository, CategoryRepository, ItemRepository, RepositoryError, Store,
};
use crate::models::{
    Admin, AdminChanges, AdminLinks, Brand, Category, Item, NamedRecord, NewAdmin, NewItem, Page,
    PageRequest, Permission, Role,
};

/// Shared, cloneable in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
    journal: Arc<RwLock<Vec<&'static str>>>,
    stale_prechecks: Arc<AtomicBool>,
}

#[derive(Debug, Default)]
struct State {
    admins: BTreeMap<AdminId, Admin>,
    links: BTreeMap<AdminId, AdminLinks>,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
    categories: BTreeMap<CategoryId, Category>,
    brands: BTreeMap<BrandId, Brand>,
    items: BTreeMap<ItemId, Item>,
    next_id: i32,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given role and permission names.
    ///
    /// IDs are assigned from 1 in slice order, separately for roles and
    /// permissions, matching a freshly seeded database.
    #[must_use]
    pub fn with_grants(roles: &[&str], permissions: &[&str]) -> Self {
        let store = Self::new();
        {
            let mut state = store.write();
            state.roles = (1..)
                .zip(roles)
                .map(|(id, name)| Role {
                    id: RoleId::new(id),
                    name: (*name).to_owned(),
                })
                .collect();
            state.permissions = (1..)
                .zip(permissions)
                .map(|(id, name)| Permission {
                    id: PermissionId::new(id),
                    name: (*name).to_owned(),
                })
                .collect();
        }
        store
    }

    /// Make every `*_taken` check report the key as free.
    ///
    /// Writes still enforce uniqueness, so this reproduces a concurrent writer
    /// committing the same key between a service's pre-check and its insert.
    pub fn set_stale_prechecks(&self, stale: bool) {
        self.stale_prechecks.store(stale, Ordering::SeqCst);
    }

    /// Names of the repository calls made so far, oldest first.
    #[must_use]
    pub fn journal(&self) -> Vec<&'static str> {
        self.journal
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_journal(&self) {
        self.journal
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of active (not soft-deleted) categories.
    #[must_use]
    pub fn active_category_count(&self) -> usize {
        self.read()
            .categories
            .values()
            .filter(|c| c.deleted_at.is_none())
            .count()
    }

    /// Total category rows including soft-deleted ones.
    #[must_use]
    pub fn category_row_count(&self) -> usize {
        self.read().categories.len()
    }

    fn record(&self, op: &'static str) {
        self.journal
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(op);
    }

    fn stale(&self) -> bool {
        self.stale_prechecks.load(Ordering::SeqCst)
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Slice out one page of rows already ordered by ID.
fn paginate<T: Clone>(rows: Vec<T>, page: PageRequest) -> Page<T> {
    let total = rows.len() as u64;
    let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let take = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    let items = rows.into_iter().skip(skip).take(take).collect();
    Page::new(items, total, page)
}

type NamedTable<I> = BTreeMap<I, NamedRecord<I>>;

fn active<I: Clone>(table: &NamedTable<I>) -> Vec<NamedRecord<I>> {
    table
        .values()
        .filter(|r| r.deleted_at.is_none())
        .cloned()
        .collect()
}

fn find_active<I: Ord + Clone>(table: &NamedTable<I>, id: I) -> Option<NamedRecord<I>> {
    table.get(&id).filter(|r| r.deleted_at.is_none()).cloned()
}

/// Mirrors the partial unique index on `name WHERE deleted_at IS NULL`.
fn name_in_use<I: PartialEq + Copy>(table: &NamedTable<I>, name: &str, exclude: Option<I>) -> bool {
    table
        .values()
        .any(|r| r.deleted_at.is_none() && r.name == name && Some(r.id) != exclude)
}

fn insert_named<I: Ord + Copy>(table: &mut NamedTable<I>, id: I, name: &str) -> NamedRecord<I> {
    let now = Utc::now();
    let record = NamedRecord {
        id,
        name: name.to_owned(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };
    table.insert(id, record.clone());
    record
}

fn rename_named<I: Ord + Copy>(
    table: &mut NamedTable<I>,
    id: I,
    name: &str,
) -> Result<NamedRecord<I>, RepositoryError> {
    if name_in_use(table, name, Some(id)) {
        return Err(RepositoryError::Conflict("name".to_owned()));
    }
    let record = table
        .get_mut(&id)
        .filter(|r| r.deleted_at.is_none())
        .ok_or(RepositoryError::NotFound)?;
    name.clone_into(&mut record.name);
    record.updated_at = Utc::now();
    Ok(record.clone())
}

fn soft_delete_named<I: Ord + Clone>(
    table: &mut NamedTable<I>,
    id: I,
) -> Result<NamedRecord<I>, RepositoryError> {
    let record = table
        .get_mut(&id)
        .filter(|r| r.deleted_at.is_none())
        .ok_or(RepositoryError::NotFound)?;
    let now = Utc::now();
    record.deleted_at = Some(now);
    record.updated_at = now;
    Ok(record.clone())
}

fn matches_keyword(admin: &Admin, keyword: &str) -> bool {
    let keyword = keyword.to_lowercase();
    admin.user_id.to_lowercase().contains(&keyword)
        || admin.user_name.to_lowercase().contains(&keyword)
}

impl AdminRepository for MemoryStore {
    async fn list_admins(
        &self,
        page: PageRequest,
        keyword: Option<&str>,
    ) -> Result<Page<Admin>, RepositoryError> {
        self.record("list_admins");
        let state = self.read();
        let rows = state
            .admins
            .values()
            .filter(|a| keyword.is_none_or(|k| k.is_empty() || matches_keyword(a, k)))
            .cloned()
            .collect();
        Ok(paginate(rows, page))
    }

    async fn find_admin(&self, id: AdminId) -> Result<Option<Admin>, RepositoryError> {
        self.record("find_admin");
        Ok(self.read().admins.get(&id).cloned())
    }

    async fn find_admin_by_user_id(&self, user_id: &str) -> Result<Option<Admin>, RepositoryError> {
        self.record("find_admin_by_user_id");
        Ok(self
            .read()
            .admins
            .values()
            .find(|a| a.user_id == user_id)
            .cloned())
    }

    async fn admin_user_id_taken(
        &self,
        user_id: &str,
        exclude: Option<AdminId>,
    ) -> Result<bool, RepositoryError> {
        self.record("admin_user_id_taken");
        if self.stale() {
            return Ok(false);
        }
        Ok(self
            .read()
            .admins
            .values()
            .any(|a| a.user_id == user_id && Some(a.id) != exclude))
    }

    async fn insert_admin(
        &self,
        admin: NewAdmin,
        links: &AdminLinks,
    ) -> Result<Admin, RepositoryError> {
        self.record("insert_admin");
        let mut state = self.write();
        if state.admins.values().any(|a| a.user_id == admin.user_id) {
            return Err(RepositoryError::Conflict("userId".to_owned()));
        }

        let now = Utc::now();
        let admin = Admin {
            id: AdminId::new(state.next_id()),
            user_id: admin.user_id,
            user_name: admin.user_name,
            password_hash: admin.password_hash,
            avatar: admin.avatar,
            created_at: now,
            updated_at: now,
        };
        state.admins.insert(admin.id, admin.clone());
        state.links.insert(admin.id, links.clone());
        Ok(admin)
    }

    async fn update_admin(
        &self,
        id: AdminId,
        changes: AdminChanges,
        links: &AdminLinks,
    ) -> Result<Admin, RepositoryError> {
        self.record("update_admin");
        let mut state = self.write();
        if state
            .admins
            .values()
            .any(|a| a.user_id == changes.user_id && a.id != id)
        {
            return Err(RepositoryError::Conflict("userId".to_owned()));
        }

        let admin = state.admins.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        admin.user_id = changes.user_id;
        admin.user_name = changes.user_name;
        admin.avatar = changes.avatar;
        if let Some(hash) = changes.password_hash {
            admin.password_hash = hash;
        }
        admin.updated_at = Utc::now();
        let admin = admin.clone();

        let (roles, permissions) = state.links.get(&id).cloned().unwrap_or_default().diff_to(links);
        let current = state.links.entry(id).or_default();
        roles.apply(&mut current.roles);
        permissions.apply(&mut current.permissions);
        Ok(admin)
    }

    async fn delete_admin(&self, id: AdminId) -> Result<Admin, RepositoryError> {
        self.record("delete_admin");
        let mut state = self.write();
        let admin = state.admins.remove(&id).ok_or(RepositoryError::NotFound)?;
        state.links.remove(&id);
        Ok(admin)
    }

    async fn admin_links(&self, id: AdminId) -> Result<AdminLinks, RepositoryError> {
        self.record("admin_links");
        Ok(self.read().links.get(&id).cloned().unwrap_or_default())
    }

    async fn replace_admin_links(
        &self,
        id: AdminId,
        links: &AdminLinks,
    ) -> Result<(), RepositoryError> {
        self.record("replace_admin_links");
        let mut state = self.write();
        if !state.admins.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        let current = state.links.entry(id).or_default();
        let (roles, permissions) = current.diff_to(links);
        roles.apply(&mut current.roles);
        permissions.apply(&mut current.permissions);
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, RepositoryError> {
        self.record("list_roles");
        Ok(self.read().roles.clone())
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, RepositoryError> {
        self.record("list_permissions");
        Ok(self.read().permissions.clone())
    }

    async fn roles_of(&self, id: AdminId) -> Result<Vec<Role>, RepositoryError> {
        self.record("roles_of");
        let state = self.read();
        let Some(links) = state.links.get(&id) else {
            return Ok(Vec::new());
        };
        Ok(state
            .roles
            .iter()
            .filter(|r| links.roles.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn permissions_of(&self, id: AdminId) -> Result<Vec<Permission>, RepositoryError> {
        self.record("permissions_of");
        let state = self.read();
        let Some(links) = state.links.get(&id) else {
            return Ok(Vec::new());
        };
        Ok(state
            .permissions
            .iter()
            .filter(|p| links.permissions.contains(&p.id))
            .cloned()
            .collect())
    }
}

impl CategoryRepository for MemoryStore {
    async fn list_categories(&self, page: PageRequest) -> Result<Page<Category>, RepositoryError> {
        self.record("list_categories");
        Ok(paginate(active(&self.read().categories), page))
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        self.record("find_category");
        Ok(find_active(&self.read().categories, id))
    }

    async fn category_name_taken(
        &self,
        name: &str,
        exclude: Option<CategoryId>,
    ) -> Result<bool, RepositoryError> {
        self.record("category_name_taken");
        if self.stale() {
            return Ok(false);
        }
        Ok(name_in_use(&self.read().categories, name, exclude))
    }

    async fn insert_category(&self, name: &str) -> Result<Category, RepositoryError> {
        self.record("insert_category");
        let mut state = self.write();
        if name_in_use(&state.categories, name, None) {
            return Err(RepositoryError::Conflict("name".to_owned()));
        }
        let id = CategoryId::new(state.next_id());
        Ok(insert_named(&mut state.categories, id, name))
    }

    async fn update_category(
        &self,
        id: CategoryId,
        name: &str,
    ) -> Result<Category, RepositoryError> {
        self.record("update_category");
        rename_named(&mut self.write().categories, id, name)
    }

    async fn soft_delete_category(&self, id: CategoryId) -> Result<Category, RepositoryError> {
        self.record("soft_delete_category");
        soft_delete_named(&mut self.write().categories, id)
    }
}

impl BrandRepository for MemoryStore {
    async fn list_brands(&self, page: PageRequest) -> Result<Page<Brand>, RepositoryError> {
        self.record("list_brands");
        Ok(paginate(active(&self.read().brands), page))
    }

    async fn find_brand(&self, id: BrandId) -> Result<Option<Brand>, RepositoryError> {
        self.record("find_brand");
        Ok(find_active(&self.read().brands, id))
    }

    async fn brand_name_taken(
        &self,
        name: &str,
        exclude: Option<BrandId>,
    ) -> Result<bool, RepositoryError> {
        self.record("brand_name_taken");
        if self.stale() {
            return Ok(false);
        }
        Ok(name_in_use(&self.read().brands, name, exclude))
    }

    async fn insert_brand(&self, name: &str) -> Result<Brand, RepositoryError> {
        self.record("insert_brand");
        let mut state = self.write();
        if name_in_use(&state.brands, name, None) {
            return Err(RepositoryError::Conflict("name".to_owned()));
        }
        let id = BrandId::new(state.next_id());
        Ok(insert_named(&mut state.brands, id, name))
    }

    async fn update_brand(&self, id: BrandId, name: &str) -> Result<Brand, RepositoryError> {
        self.record("update_brand");
        rename_named(&mut self.write().brands, id, name)
    }

    async fn soft_delete_brand(&self, id: BrandId) -> Result<Brand, RepositoryError> {
        self.record("soft_delete_brand");
        soft_delete_named(&mut self.write().brands, id)
    }
}

impl ItemRepository for MemoryStore {
    async fn list_items(&self, page: PageRequest) -> Result<Page<Item>, RepositoryError> {
        self.record("list_items");
        let rows = self
            .read()
            .items
            .values()
            .filter(|i| i.deleted_at.is_none())
            .cloned()
            .collect();
        Ok(paginate(rows, page))
    }

    async fn find_item(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        self.record("find_item");
        Ok(self
            .read()
            .items
            .get(&id)
            .filter(|i| i.deleted_at.is_none())
            .cloned())
    }

    async fn item_name_taken(
        &self,
        name: &str,
        exclude: Option<ItemId>,
    ) -> Result<bool, RepositoryError> {
        self.record("item_name_taken");
        if self.stale() {
            return Ok(false);
        }
        Ok(self
            .read()
            .items
            .values()
            .any(|i| i.deleted_at.is_none() && i.name == name && Some(i.id) != exclude))
    }

    async fn insert_item(&self, item: NewItem) -> Result<Item, RepositoryError> {
        self.record("insert_item");
        let mut state = self.write();
        if state
            .items
            .values()
            .any(|i| i.deleted_at.is_none() && i.name == item.name)
        {
            return Err(RepositoryError::Conflict("name".to_owned()));
        }

        let now = Utc::now();
        let item = Item {
            id: ItemId::new(state.next_id()),
            name: item.name,
            description: item.description,
            price: item.price,
            brand_id: item.brand_id,
            category_id: item.category_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_item(&self, id: ItemId, item: NewItem) -> Result<Item, RepositoryError> {
        self.record("update_item");
        let mut state = self.write();
        if state
            .items
            .values()
            .any(|i| i.deleted_at.is_none() && i.name == item.name && i.id != id)
        {
            return Err(RepositoryError::Conflict("name".to_owned()));
        }

        let existing = state
            .items
            .get_mut(&id)
            .filter(|i| i.deleted_at.is_none())
            .ok_or(RepositoryError::NotFound)?;
        existing.name = item.name;
        existing.description = item.description;
        existing.price = item.price;
        existing.brand_id = item.brand_id;
        existing.category_id = item.category_id;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn soft_delete_item(&self, id: ItemId) -> Result<Item, RepositoryError> {
        self.record("soft_delete_item");
        let mut state = self.write();
        let item = state
            .items
            .get_mut(&id)
            .filter(|i| i.deleted_at.is_none())
            .ok_or(RepositoryError::NotFound)?;
        let now = Utc::now();
        item.deleted_at = Some(now);
        item.updated_at = now;
        Ok(item.clone())
    }
}

impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.record("ping");
        Ok(())
    }
}
