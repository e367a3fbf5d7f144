// ============================================================================
// COMANDOS DE ACTUADOR - Escritura optimista con rollback todo-o-nada
// ============================================================================
// La UI no espera al servidor: el estado deseado se parchea en cada vista
// cacheada antes de despachar, y si el ejecutor remoto falla se restaura el
// booleano previo del actuador en cada clave. El registro de deshacer tiene
// granularidad de actuador, no de vista: el rollback de un comando no puede
// borrar la escritura de otro comando concurrente sobre la misma vista.
// Pase lo que pase, las particiones afectadas quedan obsoletas para que la
// próxima lectura re-sincronice.
// ============================================================================

use std::rc::Rc;

use crate::error::CommandFailed;
use crate::models::device::{AccionActuador, ActuadorId, ComandoActuador};
use crate::services::remote::ActuatorExecutor;
use crate::state::device_cache::{CachePartition, DeviceCacheStore};

pub struct DeviceCommandCoordinator {
    cache: Rc<DeviceCacheStore>,
    executor: Rc<dyn ActuatorExecutor>,
}

impl DeviceCommandCoordinator {
    pub fn new(cache: Rc<DeviceCacheStore>, executor: Rc<dyn ActuatorExecutor>) -> Self {
        Self { cache, executor }
    }

    /// Enviar un toggle al ejecutor remoto manteniendo coherentes las tres
    /// vistas cacheadas durante el viaje.
    ///
    /// Cada invocación posee su propio registro de deshacer: llamadas
    /// concurrentes sobre actuadores distintos no interfieren entre sí.
    /// Dos llamadas concurrentes sobre el MISMO actuador compiten y gana la
    /// última en asentarse; limitación aceptada, no se resuelve con locks.
    pub async fn submit(
        &self,
        actuador_id: ActuadorId,
        accion: AccionActuador,
    ) -> Result<(), CommandFailed> {
        // 1. Cancelar refetches en vuelo de TODA partición que pueda contener
        //    datos de dispositivos: un refetch concurrente no debe pisar la
        //    escritura optimista antes de que llegue la respuesta del comando.
        self.cache.cancel_refetches(&[
            CachePartition::Detalle,
            CachePartition::PorUsuario,
            CachePartition::PorSala,
        ]);

        // 2. Snapshot del booleano previo en cada clave afectada (registro
        //    de deshacer de ESTE call, acotado a ESTE actuador)
        let keys = self.cache.affected_keys(actuador_id);
        let snapshots = self.cache.snapshot_actuador(&keys, actuador_id);

        // 3. Parche optimista: solo el booleano del actuador, ningún otro campo
        let estado = accion.estado_objetivo();
        self.cache.apply_estado(&keys, actuador_id, estado);
        log::info!(
            "⚡ Comando optimista: actuador {} → {} ({} vistas)",
            actuador_id,
            estado,
            keys.len()
        );

        // 4. Despachar al ejecutor remoto (cancelar→snapshot→parche ya ocurrió)
        let resultado = self
            .executor
            .execute(ComandoActuador {
                actuador_id,
                accion,
            })
            .await;

        match resultado {
            Ok(()) => {
                // 6. Obsoletas igual en éxito: campos derivados que el parche
                //    no tocó se re-sincronizan en la próxima lectura
                self.cache.mark_stale(&keys);
                Ok(())
            }
            Err(e) => {
                // 5. Rollback completo y silencioso; solo CommandFailed llega
                //    al caller para mensajería
                log::warn!(
                    "❌ Comando al actuador {} falló, restaurando {} snapshots: {}",
                    actuador_id,
                    snapshots.len(),
                    e
                );
                self.cache.restore_actuador(actuador_id, snapshots);
                self.cache.mark_stale(&keys);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::device::{Actuador, Dispositivo, Gpio};
    use crate::services::remote::LocalFuture;
    use crate::state::device_cache::CacheKey;
    use futures::executor::block_on;
    use futures::join;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    // Futuro que cede el control una vez antes de resolverse: permite que
    // dos submit() concurrentes parcheen antes de que ninguno se asiente.
    struct CedeUnaVez {
        cedido: bool,
    }

    impl Future for CedeUnaVez {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.cedido {
                Poll::Ready(())
            } else {
                self.cedido = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    /// Ejecutor guionado: resultado por actuador, con cesión de control
    struct ScriptedExecutor {
        resultados: RefCell<HashMap<ActuadorId, Result<(), CommandFailed>>>,
        comandos: RefCell<Vec<ComandoActuador>>,
    }

    impl ScriptedExecutor {
        fn new() -> Self {
            Self {
                resultados: RefCell::new(HashMap::new()),
                comandos: RefCell::new(Vec::new()),
            }
        }

        fn script(&self, actuador_id: ActuadorId, resultado: Result<(), CommandFailed>) {
            self.resultados.borrow_mut().insert(actuador_id, resultado);
        }
    }

    impl ActuatorExecutor for ScriptedExecutor {
        fn execute(&self, comando: ComandoActuador) -> LocalFuture<'_, Result<(), CommandFailed>> {
            self.comandos.borrow_mut().push(comando);
            let resultado = self
                .resultados
                .borrow()
                .get(&comando.actuador_id)
                .cloned()
                .unwrap_or(Ok(()));
            Box::pin(async move {
                CedeUnaVez { cedido: false }.await;
                resultado
            })
        }
    }

    fn dispositivo(id: i64, actuadores: &[(ActuadorId, bool)]) -> Dispositivo {
        Dispositivo {
            id,
            nombre: format!("disp-{}", id),
            usuario_id: Some("u-1".to_string()),
            sala_id: Some(5),
            gpios: vec![Gpio {
                id: 1,
                pin: 2,
                sensores: vec![],
                actuadores: actuadores
                    .iter()
                    .map(|(aid, estado)| Actuador {
                        id: *aid,
                        nombre: format!("act-{}", aid),
                        estado: *estado,
                    })
                    .collect(),
            }],
        }
    }

    fn cache_poblada(actuadores: &[(ActuadorId, bool)]) -> Rc<DeviceCacheStore> {
        let cache = Rc::new(DeviceCacheStore::new());
        cache.insert_detalle(dispositivo(7, actuadores));
        cache.insert_por_usuario("u-1".to_string(), vec![dispositivo(7, actuadores)]);
        cache.insert_por_sala(5, vec![dispositivo(7, actuadores)]);
        cache
    }

    fn claves_de(cache: &DeviceCacheStore, actuador_id: ActuadorId) -> Vec<CacheKey> {
        cache.affected_keys(actuador_id)
    }

    #[test]
    fn exito_converge_las_tres_vistas_al_estado_deseado() {
        let cache = cache_poblada(&[(42, false)]);
        let executor = Rc::new(ScriptedExecutor::new());
        let coordinador = DeviceCommandCoordinator::new(cache.clone(), executor.clone());

        block_on(coordinador.submit(42, AccionActuador::Encender)).unwrap();

        for key in claves_de(&cache, 42) {
            assert_eq!(cache.actuador_estado(&key, 42), Some(true));
        }
        // el comando viajó con la acción en el cable
        assert_eq!(
            executor.comandos.borrow()[0],
            ComandoActuador {
                actuador_id: 42,
                accion: AccionActuador::Encender
            }
        );
    }

    #[test]
    fn fallo_restaura_el_valor_exacto_en_las_tres_vistas() {
        // P3 / Escenario C: actuador 42 en false, el comando remoto falla
        let cache = cache_poblada(&[(42, false)]);
        let executor = Rc::new(ScriptedExecutor::new());
        executor.script(42, Err(CommandFailed("HTTP 502".to_string())));
        let coordinador = DeviceCommandCoordinator::new(cache.clone(), executor);

        let resultado = block_on(coordinador.submit(42, AccionActuador::Encender));
        assert_eq!(resultado, Err(CommandFailed("HTTP 502".to_string())));

        for key in claves_de(&cache, 42) {
            assert_eq!(cache.actuador_estado(&key, 42), Some(false));
        }
    }

    #[test]
    fn el_parche_optimista_es_visible_durante_el_vuelo() {
        // Escenario C, primera mitad: las tres vistas muestran true ANTES de
        // que el ejecutor responda. El ejecutor observa la caché en vuelo.
        struct ExecutorObservador {
            cache: Rc<DeviceCacheStore>,
            visto: RefCell<Vec<Option<bool>>>,
        }

        impl ActuatorExecutor for ExecutorObservador {
            fn execute(
                &self,
                comando: ComandoActuador,
            ) -> LocalFuture<'_, Result<(), CommandFailed>> {
                for key in self.cache.affected_keys(comando.actuador_id) {
                    self.visto
                        .borrow_mut()
                        .push(self.cache.actuador_estado(&key, comando.actuador_id));
                }
                Box::pin(async move { Err(CommandFailed("rechazado".to_string())) })
            }
        }

        let cache = cache_poblada(&[(42, false)]);
        let executor = Rc::new(ExecutorObservador {
            cache: cache.clone(),
            visto: RefCell::new(Vec::new()),
        });
        let coordinador = DeviceCommandCoordinator::new(cache.clone(), executor.clone());

        let _ = block_on(coordinador.submit(42, AccionActuador::Encender));

        // en vuelo: true en las tres vistas; tras el fallo: false de nuevo
        assert_eq!(*executor.visto.borrow(), vec![Some(true); 3]);
        for key in claves_de(&cache, 42) {
            assert_eq!(cache.actuador_estado(&key, 42), Some(false));
        }
    }

    #[test]
    fn submits_concurrentes_de_actuadores_distintos_no_se_pisan() {
        // P4: el rollback del que falla no deshace la escritura del que no
        let cache = cache_poblada(&[(1, false), (2, false)]);
        let executor = Rc::new(ScriptedExecutor::new());
        executor.script(2, Err(CommandFailed("timeout".to_string())));
        let coordinador = DeviceCommandCoordinator::new(cache.clone(), executor);

        let (r1, r2) = block_on(async {
            join!(
                coordinador.submit(1, AccionActuador::Encender),
                coordinador.submit(2, AccionActuador::Encender)
            )
        });

        assert_eq!(r1, Ok(()));
        assert_eq!(r2, Err(CommandFailed("timeout".to_string())));

        for key in claves_de(&cache, 1) {
            assert_eq!(cache.actuador_estado(&key, 1), Some(true));
        }
        for key in claves_de(&cache, 2) {
            assert_eq!(cache.actuador_estado(&key, 2), Some(false));
        }
    }

    #[test]
    fn el_rollback_del_que_falla_primero_no_borra_la_escritura_del_otro() {
        // el orden inverso al anterior: el comando que FALLA es el primero
        // en despacharse y su snapshot se tomó antes del parche del segundo.
        // Con granularidad de actuador el rollback no puede arrastrarlo.
        let cache = cache_poblada(&[(1, false), (2, false)]);
        let executor = Rc::new(ScriptedExecutor::new());
        executor.script(1, Err(CommandFailed("timeout".to_string())));
        let coordinador = DeviceCommandCoordinator::new(cache.clone(), executor);

        let (r1, r2) = block_on(async {
            join!(
                coordinador.submit(1, AccionActuador::Encender),
                coordinador.submit(2, AccionActuador::Encender)
            )
        });

        assert_eq!(r1, Err(CommandFailed("timeout".to_string())));
        assert_eq!(r2, Ok(()));

        for key in claves_de(&cache, 1) {
            assert_eq!(cache.actuador_estado(&key, 1), Some(false));
        }
        for key in claves_de(&cache, 2) {
            assert_eq!(cache.actuador_estado(&key, 2), Some(true));
        }
    }

    #[test]
    fn toda_particion_afectada_queda_obsoleta_al_asentarse() {
        // P5: igual en éxito que en fallo
        for fallo in [false, true] {
            let cache = cache_poblada(&[(42, false)]);
            let executor = Rc::new(ScriptedExecutor::new());
            if fallo {
                executor.script(42, Err(CommandFailed("error".to_string())));
            }
            let coordinador = DeviceCommandCoordinator::new(cache.clone(), executor);

            let _ = block_on(coordinador.submit(42, AccionActuador::Apagar));

            for key in claves_de(&cache, 42) {
                assert_eq!(cache.is_stale(&key), Some(true), "fallo={}", fallo);
            }
        }
    }

    #[test]
    fn submit_cancela_los_refetches_en_vuelo_antes_de_parchear() {
        let cache = cache_poblada(&[(42, false)]);
        let ticket = cache.begin_refetch(CachePartition::PorSala);
        let coordinador =
            DeviceCommandCoordinator::new(cache.clone(), Rc::new(ScriptedExecutor::new()));

        block_on(coordinador.submit(42, AccionActuador::Encender)).unwrap();

        assert!(ticket.is_cancelled());
    }

    #[test]
    fn actuador_fuera_de_cache_solo_despacha() {
        // ausencia total: ninguna clave afectada, el comando viaja igual
        let cache = Rc::new(DeviceCacheStore::new());
        let executor = Rc::new(ScriptedExecutor::new());
        let coordinador = DeviceCommandCoordinator::new(cache, executor.clone());

        block_on(coordinador.submit(42, AccionActuador::Encender)).unwrap();
        assert_eq!(executor.comandos.borrow().len(), 1);
    }
}
