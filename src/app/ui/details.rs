use eframe::egui::{self, RichText, Ui};

use crate::util::{format_usd, short_address};

use super::super::ViewModel;

/// Owned snapshot of everything the details panel shows, collected up front
/// so the store borrow ends before any button mutates the model.
struct SelectedDetails {
    id: String,
    label: String,
    category: &'static str,
    usdt_balance: f64,
    is_main: bool,
    is_grouped: bool,
    tokens: Vec<(String, f64, f64)>,
    transfers: Vec<TransferRow>,
}

struct TransferRow {
    inbound: bool,
    counterparty: String,
    usdt_amount: f64,
}

impl ViewModel {
    fn selected_details(&self) -> Option<SelectedDetails> {
        let id = self.selected.as_deref()?;
        let node = self.store.node(id)?;

        let transfers = self
            .store
            .incident_links(id)
            .map(|link| {
                let inbound = link.receiver == id;
                TransferRow {
                    inbound,
                    counterparty: if inbound {
                        link.sender.clone()
                    } else {
                        link.receiver.clone()
                    },
                    usdt_amount: link.usdt_amount,
                }
            })
            .collect();

        Some(SelectedDetails {
            id: node.id.clone(),
            label: if node.name.is_empty() {
                short_address(&node.id)
            } else {
                node.name.clone()
            },
            category: node.category.label(),
            usdt_balance: node.usdt_balance,
            is_main: self.is_main(&node.id),
            is_grouped: self.grouped.contains(&node.id),
            tokens: node
                .tokens
                .iter()
                .map(|token| (token.name.clone(), token.amount, token.usdt_amount))
                .collect(),
            transfers,
        })
    }

    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.add_space(6.0);
        ui.heading("Details");
        ui.add_space(4.0);

        let Some(details) = self.selected_details() else {
            ui.label(RichText::new("Click a node to inspect it.").weak());
            return;
        };

        ui.strong(&details.label);
        ui.label(RichText::new(&details.id).weak().monospace());
        ui.label(format!("category: {}", details.category));
        ui.label(format!("balance: {}", format_usd(details.usdt_balance)));
        if details.is_main {
            ui.label(if details.is_grouped {
                "main address (grouped)"
            } else {
                "main address"
            });
        }

        ui.add_space(6.0);
        if details.is_main {
            let toggle_label = if details.is_grouped { "Ungroup" } else { "Group" };
            if ui.button(toggle_label).clicked() {
                self.toggle_group(&details.id);
            }
        } else if ui.button("Focus address").clicked() {
            self.focus_address(&details.id);
        }

        if !details.tokens.is_empty() {
            ui.add_space(8.0);
            ui.separator();
            ui.heading("Tokens");
            for (name, amount, usdt_amount) in &details.tokens {
                ui.label(format!("{name}: {amount} ({})", format_usd(*usdt_amount)));
            }
        }

        ui.add_space(8.0);
        ui.separator();
        ui.heading(format!("Transfers ({})", details.transfers.len()));
        ui.add_space(4.0);

        let mut select = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for transfer in &details.transfers {
                ui.horizontal(|ui| {
                    ui.label(if transfer.inbound { "in" } else { "out" });
                    if ui
                        .link(short_address(&transfer.counterparty))
                        .clicked()
                    {
                        select = Some(transfer.counterparty.clone());
                    }
                    ui.label(RichText::new(format_usd(transfer.usdt_amount)).weak());
                });
            }
        });
        if let Some(address) = select {
            self.selected = Some(address);
        }
    }
}
