//! Action API.
//!
//! Every action validates and mutates the board under the board lock,
//! releases the lock, then hands the encoded command to the writer.
//! Actions fail with `NotRunning` while the controller is stopped.

use bytes::Bytes;
use tracing::{debug, info};

use super::Controller;
use crate::error::{PodError, Result};
use crate::message::encode::{self, CURRENT};
use crate::message::setup::{self, SetupTarget};
use crate::message::MessageKind;
use crate::model::{
    Dt, DtField, ItemRole, PedalBoard, PositionClass, Slot, NUMBER_SET, PRESETS_PER_SET,
    PRESET_NAME_LEN,
};
use crate::notify::Notification;
use crate::writer::WriterHandle;

/// Board tempo limits in BPM.
const TEMPO_RANGE: std::ops::RangeInclusive<f32> = 30.0..=240.0;

async fn send_all(writer: &WriterHandle, messages: Vec<Bytes>) -> Result<()> {
    for message in messages {
        writer.send(message).await?;
    }
    Ok(())
}

fn current_preset_name(board: &PedalBoard) -> Option<[u8; PRESET_NAME_LEN]> {
    let set = board.set(board.current_set()?).ok()?;
    Some(set.preset(board.current_preset()?)?.raw_name())
}

fn check_index(what: &str, id: u32, count: usize) -> Result<()> {
    if id as usize >= count {
        return Err(PodError::Validation(format!(
            "{} {} out of range 0..{}",
            what, id, count
        )));
    }
    Ok(())
}

impl Controller {
    /// Ask the device for the preset it currently plays.
    pub async fn query_current_preset(&self) -> Result<()> {
        let writer = self.inner.writer()?;
        writer.send(encode::preset_query(CURRENT, CURRENT)).await
    }

    /// Pull every preset of every set from the device.
    ///
    /// Each step points the board at (set, preset), queries it and waits
    /// until the preset dump has been applied. Progress is reported after
    /// each preset. The board pointers are left on the last preset.
    pub async fn query_all_presets(&self) -> Result<()> {
        let _scan = self.inner.scan.begin()?;
        let total = NUMBER_SET * PRESETS_PER_SET;
        info!("Querying all {} presets", total);

        for set in 0..NUMBER_SET {
            for preset in 0..PRESETS_PER_SET {
                let (writer, stop_rx) = self.inner.session()?;
                {
                    let mut board = self.inner.board.lock();
                    board.select_set(set as u32);
                    board.select_preset(preset as u32);
                }
                let answer = self.inner.scan.arm(MessageKind::PresetLoad);
                writer
                    .send(encode::preset_query(preset as u16, set as u16))
                    .await?;
                drop(writer);
                self.inner.wait_for(answer, stop_rx).await?;

                let percent = ((set * PRESETS_PER_SET) + (preset + 1)) * 100 / total;
                self.inner.notify(Notification::progress(percent as u8));
            }
        }
        Ok(())
    }

    /// Pull the name of every set from the device.
    pub async fn query_all_sets(&self) -> Result<()> {
        let _scan = self.inner.scan.begin()?;
        info!("Querying all {} sets", NUMBER_SET);

        for set in 0..NUMBER_SET {
            let (writer, stop_rx) = self.inner.session()?;
            self.inner.board.lock().select_set(set as u32);
            let answer = self.inner.scan.arm(MessageKind::SetLoad);
            writer.send(encode::set_query(set as u32)).await?;
            drop(writer);
            self.inner.wait_for(answer, stop_rx).await?;

            let percent = (set + 1) * 100 / NUMBER_SET;
            self.inner.notify(Notification::progress(percent as u8));
        }
        Ok(())
    }

    /// Set an item parameter from its editor string.
    ///
    /// Cab parameters go out as setup changes and tempo parameters as tempo
    /// changes; a tempo in free-Hz mode also sends the raw value.
    pub async fn set_parameter_value(&self, item_id: u32, param_id: u32, value: &str) -> Result<()> {
        let writer = self.inner.writer()?;
        let messages = {
            let mut board = self.inner.board.lock();
            let item = board.rig_mut().item_mut(item_id)?;
            let role = item.role();
            let tempo = item.tempo_index(param_id);
            let setup_id = match role {
                ItemRole::Cab => Some(
                    setup::id_for(SetupTarget::CabParam {
                        cab: item_id,
                        param: param_id,
                    })
                    .ok_or_else(|| {
                        PodError::NotFound(format!("cab {} parameter {}", item_id, param_id))
                    })?,
                ),
                _ => None,
            };
            let model = item.model_name();
            let param = item.param_mut(param_id).ok_or_else(|| {
                PodError::NotFound(format!("parameter {:#x} on {}", param_id, model))
            })?;
            param.set_text(Slot::Current, value)?;
            debug!("{} {} = {}", model, param.name(), param.text(Slot::Current));

            match (setup_id, tempo) {
                (Some(id), _) => vec![encode::setup_param_change(id, param)],
                (None, Some(nth)) => {
                    let mut messages = vec![encode::tempo_change(item_id, nth, param)];
                    if param.current_f32() <= 1.0 {
                        messages.push(encode::parameter_change(item_id, param, Slot::Current));
                    }
                    messages
                }
                (None, None) => vec![encode::parameter_change(item_id, param, Slot::Current)],
            }
        };
        send_all(&writer, messages).await
    }

    /// Set a board-level parameter (input sources, guitar impedance).
    pub async fn set_board_parameter_value(&self, param_id: u32, value: &str) -> Result<()> {
        let writer = self.inner.writer()?;
        let message = {
            let mut board = self.inner.board.lock();
            let setup_id = setup::id_for(SetupTarget::BoardParam(param_id)).ok_or_else(|| {
                PodError::NotFound(format!("board parameter {}", param_id))
            })?;
            let param = board.rig_mut().param_mut(param_id)?;
            param.set_text(Slot::Current, value)?;
            encode::setup_param_change(setup_id, param)
        };
        writer.send(message).await
    }

    /// Set the board tempo in BPM.
    pub async fn set_tempo(&self, bpm: f32) -> Result<()> {
        let writer = self.inner.writer()?;
        if !TEMPO_RANGE.contains(&bpm) {
            return Err(PodError::Validation(format!(
                "tempo {} outside {:?} BPM",
                bpm, TEMPO_RANGE
            )));
        }
        self.inner.board.lock().rig_mut().set_tempo(bpm);
        writer
            .send(encode::setup_change(
                setup::TEMPO,
                crate::protocol::value_type::FLOAT32,
                bpm.to_le_bytes(),
            ))
            .await
    }

    pub async fn set_item_active(&self, item_id: u32, active: bool) -> Result<()> {
        let writer = self.inner.writer()?;
        self.inner
            .board
            .lock()
            .rig_mut()
            .item_mut(item_id)?
            .set_active(active);
        writer.send(encode::active_change(item_id, active)).await
    }

    /// Re-type an item by model name, then re-read the current preset.
    ///
    /// `category` only matters for pedals.
    pub async fn set_item_type(&self, item_id: u32, category: &str, model: &str) -> Result<()> {
        let writer = self.inner.writer()?;
        let code = {
            let mut board = self.inner.board.lock();
            let item = board.rig_mut().item_mut(item_id)?;
            item.retype_by_name(category, model)?;
            item.model_code()
        };
        send_all(
            &writer,
            vec![
                encode::type_change(item_id, code),
                encode::preset_query(CURRENT, CURRENT),
            ],
        )
        .await
    }

    /// Move an item on the board. Model only; nothing is sent until the
    /// preset is saved.
    pub fn set_item_position(&self, item_id: u32, pos: u16, class: PositionClass) -> Result<()> {
        self.inner.writer()?;
        self.inner
            .board
            .lock()
            .rig_mut()
            .move_item(item_id, pos, class)
    }

    async fn set_dt(
        &self,
        dt_id: u8,
        field: DtField,
        apply: impl FnOnce(&mut Dt) -> Result<()>,
    ) -> Result<()> {
        let writer = self.inner.writer()?;
        let message = {
            let mut board = self.inner.board.lock();
            let dt = board.rig_mut().dt_mut(dt_id)?;
            apply(dt)?;
            encode::dt_change(dt, field)
        };
        writer.send(message).await
    }

    /// "A" or "A/B".
    pub async fn set_dt_class(&self, dt_id: u8, value: &str) -> Result<()> {
        self.set_dt(dt_id, DtField::Class, |dt| dt.set_class(value))
            .await
    }

    /// "Tri" or "Pent".
    pub async fn set_dt_mode(&self, dt_id: u8, value: &str) -> Result<()> {
        self.set_dt(dt_id, DtField::Mode, |dt| dt.set_mode(value))
            .await
    }

    /// "I" to "IV".
    pub async fn set_dt_topology(&self, dt_id: u8, value: &str) -> Result<()> {
        self.set_dt(dt_id, DtField::Topology, |dt| dt.set_topology(value))
            .await
    }

    /// Switch the device to another preset of the current set.
    pub async fn select_preset(&self, preset: u32) -> Result<()> {
        let writer = self.inner.writer()?;
        check_index("preset", preset, PRESETS_PER_SET)?;
        writer.send(encode::preset_change(preset)).await
    }

    /// Switch the device to another set.
    pub async fn select_set(&self, set: u32) -> Result<()> {
        let writer = self.inner.writer()?;
        check_index("set", set, NUMBER_SET)?;
        writer.send(encode::set_change(set)).await
    }

    /// Store the live rig into (set, preset) on the device.
    ///
    /// Needs a preset dump received earlier; the saved preset keeps the
    /// name of the preset currently selected.
    pub async fn save_preset(&self, set: u8, preset: u8) -> Result<()> {
        let writer = self.inner.writer()?;
        let message = {
            let mut board = self.inner.board.lock();
            let dump = board
                .last_dump()
                .cloned()
                .ok_or_else(|| PodError::NotFound("no preset dump received yet".to_string()))?;
            let target = board
                .set(set)?
                .preset(preset)
                .ok_or_else(|| PodError::NotFound(format!("preset {} of set {}", preset, set)))?;
            let name = current_preset_name(&board).unwrap_or_else(|| target.raw_name());

            let message = encode::preset_set(
                board.rig(),
                &dump,
                u16::from(preset),
                u16::from(set),
                name,
            )?;

            let rig = board.rig().clone();
            if let Some(slot) = board.set_mut(set)?.preset_mut(preset) {
                slot.set_name(&String::from_utf8_lossy(&name));
                *slot.rig_mut() = rig;
            }
            message
        };
        info!("Saving preset {} of set {}", preset, set);
        writer.send(message).await
    }
}
