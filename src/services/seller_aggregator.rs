// src/services/seller_aggregator.rs

use std::collections::HashMap;

use crate::models::fulfillment::{SellerSummary, SubOrder};

/// Uma entrada por sellerId, na ordem da primeira aparição.
///
/// Em sellerId repetido, shopName/status/amount são sobrescritos pela
/// última perna vista (não somados). As pernas ficam todas em `legs`.
pub fn aggregate_sellers(sub_orders: &[SubOrder]) -> Vec<SellerSummary> {
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut sellers: Vec<SellerSummary> = Vec::new();

    for leg in sub_orders {
        match position.get(leg.seller_id.as_str()) {
            Some(&idx) => {
                let summary = &mut sellers[idx];
                summary.shop_name = leg.shop_name.clone();
                summary.delivery_status = leg.delivery_status;
                summary.amount = leg.amount;
                summary.legs.push(leg.clone());
            }
            None => {
                position.insert(leg.seller_id.as_str(), sellers.len());
                sellers.push(SellerSummary {
                    seller_id: leg.seller_id.clone(),
                    shop_name: leg.shop_name.clone(),
                    delivery_status: leg.delivery_status,
                    amount: leg.amount,
                    legs: vec![leg.clone()],
                });
            }
        }
    }

    sellers
}
