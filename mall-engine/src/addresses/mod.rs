//! Shipping address book.
//!
//! Addresses are strictly per user; looking up another user's address
//! reports "not found" rather than "forbidden", so ids don't leak
//! existence. The first address a user creates becomes the default,
//! and marking one default clears the previous one.

use shared::util::now_millis;
use shared::{ApiError, ApiResult};

use crate::common::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, validate_phone, validate_required_text,
};
use crate::db::models::{Address, AddressInput, AddressUpdate};
use crate::db::storage::SEQ_ADDRESSES;
use crate::db::{MallStorage, commit_txn, storage_failure};

#[derive(Clone)]
pub struct AddressBook {
    storage: MallStorage,
}

impl AddressBook {
    pub fn new(storage: MallStorage) -> Self {
        Self { storage }
    }

    /// The user's addresses, default first, then newest first.
    pub fn list(&self, user_id: u64) -> ApiResult<Vec<Address>> {
        let mut addresses = self
            .storage
            .addresses_for_user(user_id)
            .map_err(storage_failure)?;
        addresses.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });
        Ok(addresses)
    }

    pub fn get(&self, user_id: u64, address_id: u64) -> ApiResult<Address> {
        self.storage
            .get_address(address_id)
            .map_err(storage_failure)?
            .filter(|a| a.user_id == user_id)
            .ok_or_else(|| ApiError::not_found("address"))
    }

    pub fn add(&self, user_id: u64, input: &AddressInput) -> ApiResult<Address> {
        validate_input(input)?;

        let txn = self.storage.begin_write().map_err(storage_failure)?;

        let existing = self
            .storage
            .addresses_for_user_txn(&txn, user_id)
            .map_err(storage_failure)?;
        let is_default = input.is_default || existing.is_empty();
        if input.is_default {
            self.clear_default(&txn, &existing)?;
        }

        let now = now_millis();
        let address = Address {
            id: self
                .storage
                .next_sequence(&txn, SEQ_ADDRESSES)
                .map_err(storage_failure)?,
            user_id,
            name: input.name.trim().to_string(),
            phone: input.phone.trim().to_string(),
            province: input.province.trim().to_string(),
            city: input.city.trim().to_string(),
            district: input.district.trim().to_string(),
            detail: input.detail.trim().to_string(),
            is_default,
            created_at: now,
            updated_at: now,
        };
        self.storage
            .put_address(&txn, &address)
            .map_err(storage_failure)?;
        commit_txn(txn)?;
        Ok(address)
    }

    pub fn update(
        &self,
        user_id: u64,
        address_id: u64,
        update: &AddressUpdate,
    ) -> ApiResult<Address> {
        let txn = self.storage.begin_write().map_err(storage_failure)?;

        let mut address = self
            .storage
            .get_address_txn(&txn, address_id)
            .map_err(storage_failure)?
            .filter(|a| a.user_id == user_id)
            .ok_or_else(|| ApiError::not_found("address"))?;

        if let Some(name) = &update.name {
            validate_required_text(name, "recipient name", MAX_NAME_LEN)?;
            address.name = name.trim().to_string();
        }
        if let Some(phone) = &update.phone {
            validate_phone(phone.trim(), "phone")?;
            address.phone = phone.trim().to_string();
        }
        if let Some(province) = &update.province {
            validate_required_text(province, "province", MAX_ADDRESS_LEN)?;
            address.province = province.trim().to_string();
        }
        if let Some(city) = &update.city {
            validate_required_text(city, "city", MAX_ADDRESS_LEN)?;
            address.city = city.trim().to_string();
        }
        if let Some(district) = &update.district {
            validate_required_text(district, "district", MAX_ADDRESS_LEN)?;
            address.district = district.trim().to_string();
        }
        if let Some(detail) = &update.detail {
            validate_required_text(detail, "detail", MAX_ADDRESS_LEN)?;
            address.detail = detail.trim().to_string();
        }
        if update.is_default == Some(true) && !address.is_default {
            let others = self
                .storage
                .addresses_for_user_txn(&txn, user_id)
                .map_err(storage_failure)?;
            self.clear_default(&txn, &others)?;
            address.is_default = true;
        }

        address.updated_at = now_millis();
        self.storage
            .put_address(&txn, &address)
            .map_err(storage_failure)?;
        commit_txn(txn)?;
        Ok(address)
    }

    /// Remove an address. Orders keep their snapshot, so removal never
    /// affects history.
    pub fn remove(&self, user_id: u64, address_id: u64) -> ApiResult<()> {
        let txn = self.storage.begin_write().map_err(storage_failure)?;

        self.storage
            .get_address_txn(&txn, address_id)
            .map_err(storage_failure)?
            .filter(|a| a.user_id == user_id)
            .ok_or_else(|| ApiError::not_found("address"))?;
        self.storage
            .delete_address(&txn, address_id)
            .map_err(storage_failure)?;
        commit_txn(txn)
    }

    fn clear_default(&self, txn: &redb::WriteTransaction, addresses: &[Address]) -> ApiResult<()> {
        for address in addresses.iter().filter(|a| a.is_default) {
            let mut cleared = address.clone();
            cleared.is_default = false;
            cleared.updated_at = now_millis();
            self.storage
                .put_address(txn, &cleared)
                .map_err(storage_failure)?;
        }
        Ok(())
    }
}

fn validate_input(input: &AddressInput) -> ApiResult<()> {
    validate_required_text(&input.name, "recipient name", MAX_NAME_LEN)?;
    validate_phone(input.phone.trim(), "phone")?;
    validate_required_text(&input.province, "province", MAX_ADDRESS_LEN)?;
    validate_required_text(&input.city, "city", MAX_ADDRESS_LEN)?;
    validate_required_text(&input.district, "district", MAX_ADDRESS_LEN)?;
    validate_required_text(&input.detail, "detail", MAX_ADDRESS_LEN)?;
    Ok(())
}
